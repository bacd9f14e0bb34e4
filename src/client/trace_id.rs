use tracing::info;

/// 完整 trace id 的十六进制长度
pub const TRACE_ID_HEX_LEN: usize = 32;

/// 规范化 kickoff 返回的 trace id
///
/// 后端以十六进制输出 trace id 时会丢掉前导 0，长度为 31 时补回一个 `0`。
/// 空字符串表示没有可用的 trace id。
pub fn normalize_trace_id(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.len() == TRACE_ID_HEX_LEN - 1 {
        info!(trace_id = raw, "trace id lost its leading zero, padding");
        return Some(format!("0{raw}"));
    }
    Some(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_31_character_trace_ids() {
        assert_eq!(
            normalize_trace_id("1234567890123456789012345678901").as_deref(),
            Some("01234567890123456789012345678901")
        );
    }

    #[test]
    fn leaves_other_lengths_untouched() {
        let full = "abcdef0123456789abcdef0123456789";
        assert_eq!(normalize_trace_id(full).as_deref(), Some(full));
        assert_eq!(normalize_trace_id("abc").as_deref(), Some("abc"));
    }

    #[test]
    fn empty_trace_id_is_absent() {
        assert_eq!(normalize_trace_id(""), None);
    }
}
