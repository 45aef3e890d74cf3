//! 访客指纹
//!
//! 指纹 = xxh64(IP + User-Agent) 的 16 位 hex。
//! 只用于首扫/回访分类；碰撞是已接受的近似，
//! 解析引擎把指纹当不透明字符串键使用。

use xxhash_rust::xxh64::xxh64;

/// 从客户端 IP 与 User-Agent 派生访客指纹
///
/// 两者都缺失时退化为空输入哈希，仍是稳定键。
pub fn visitor_fingerprint(ip: Option<&str>, user_agent: Option<&str>) -> String {
    let mut input = String::new();
    if let Some(ip) = ip {
        input.push_str(ip);
    }
    input.push('|');
    if let Some(ua) = user_agent {
        input.push_str(ua);
    }
    format!("{:016x}", xxh64(input.as_bytes(), 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = visitor_fingerprint(Some("203.0.113.7"), Some("Mozilla/5.0"));
        let b = visitor_fingerprint(Some("203.0.113.7"), Some("Mozilla/5.0"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_fingerprint_discriminates() {
        let a = visitor_fingerprint(Some("203.0.113.7"), Some("Mozilla/5.0"));
        let b = visitor_fingerprint(Some("203.0.113.8"), Some("Mozilla/5.0"));
        let c = visitor_fingerprint(Some("203.0.113.7"), Some("curl/8.0"));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ip_ua_boundary_is_unambiguous() {
        // 分隔符保证 ("ab", "c") 与 ("a", "bc") 不同
        let a = visitor_fingerprint(Some("ab"), Some("c"));
        let b = visitor_fingerprint(Some("a"), Some("bc"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_parts_still_hash() {
        assert_eq!(visitor_fingerprint(None, None).len(), 16);
    }
}
