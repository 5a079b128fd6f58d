/// 公开对象在代理模式下的缓存控制头部值
pub const PUBLIC_CACHE_CONTROL: &str = "public, max-age=2592000";

/// 私有对象在代理模式下的缓存控制头部值，不允许共享缓存
pub const PRIVATE_CACHE_CONTROL: &str = "private, no-cache";
