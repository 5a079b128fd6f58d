use http::Uri;

/// 拼接对象键：目录前缀 + 文件名，不对文件名做任何规范化
///
/// # 示例
///
/// ```
/// use attachment_store::utils::path::object_key;
///
/// assert_eq!(object_key("uploads/", "a1b2"), "uploads/a1b2");
/// assert_eq!(object_key("", "a1b2"), "a1b2");
/// ```
pub fn object_key(folder: &str, filename: &str) -> String {
    format!("{folder}{filename}")
}

/// 对键的每一段分别做百分号编码，保留 `/` 分隔符
///
/// # 示例
///
/// ```
/// use attachment_store::utils::path::encode_key;
///
/// assert_eq!(encode_key("uploads/My Report.pdf"), "uploads/My%20Report.pdf");
/// ```
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// 计算对象的公开访问 URL，不访问网络
///
/// # 参数
///
/// * `endpoint` - 自定义端点，未设置时使用 AWS 的区域端点
/// * `bucket` - 存储桶名称
/// * `region` - 区域，仅在没有自定义端点时使用
/// * `force_path_style` - 是否使用路径风格地址（`endpoint/bucket/key`）
/// * `key` - 对象键
///
/// # 返回值
///
/// 不带任何签名参数的 URL
pub fn public_object_url(
    endpoint: Option<&str>,
    bucket: &str,
    region: &str,
    force_path_style: bool,
    key: &str,
) -> String {
    let key = encode_key(key);

    match endpoint {
        Some(endpoint) if force_path_style => format!("{endpoint}/{bucket}/{key}"),
        Some(endpoint) => match virtual_host_base(endpoint, bucket) {
            Some(base) => format!("{base}/{key}"),
            // 无法解析出 scheme 和主机时退回路径风格
            None => format!("{endpoint}/{bucket}/{key}"),
        },
        None if force_path_style => format!("https://s3.{region}.amazonaws.com/{bucket}/{key}"),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
    }
}

fn virtual_host_base(endpoint: &str, bucket: &str) -> Option<String> {
    let uri: Uri = endpoint.parse().ok()?;
    let scheme = uri.scheme_str()?;
    let authority = uri.authority()?;
    let path = uri.path().trim_end_matches('/');
    Some(format!("{scheme}://{bucket}.{authority}{path}"))
}
