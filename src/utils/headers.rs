/// 未指定类型时上传对象使用的 Content-Type
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 生成内联展示的 Content-Disposition 头部值
///
/// 原始文件名按 RFC 3986 百分号编码，只保留非保留字符（字母、数字、`-`、`.`、`_`、`~`）。
///
/// # 示例
///
/// ```
/// use attachment_store::utils::headers::inline_content_disposition;
///
/// assert_eq!(
///     inline_content_disposition("My Report.pdf"),
///     "inline; filename=My%20Report.pdf"
/// );
/// ```
pub fn inline_content_disposition(original_filename: &str) -> String {
    format!("inline; filename={}", urlencoding::encode(original_filename))
}

/// 根据文件名猜测 MIME 类型
///
/// # 返回值
///
/// 能识别扩展名时返回 MIME 类型，否则返回 `None`
pub fn guess_mime_type(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first_raw()
        .map(str::to_string)
}
