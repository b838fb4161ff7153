use serde_json::json;

/// Liveness check body: always healthy if the process can answer.
pub fn live_check_body() -> String {
    json!({"status": "alive"}).to_string()
}

/// Readiness check body: ready once the translator has attached its
/// egress/ingress hooks. `attached` is `true` once `Translator::attach_*`
/// has returned successfully for every configured direction.
pub fn ready_check_body(attached: bool) -> (u16, String) {
    if attached {
        (200, json!({"status": "ready"}).to_string())
    } else {
        (503, json!({"status": "not_ready", "reason": "translator_not_attached"}).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_reports_503_when_not_attached() {
        let (status, _) = ready_check_body(false);
        assert_eq!(status, 503);
    }

    #[test]
    fn ready_reports_200_when_attached() {
        let (status, _) = ready_check_body(true);
        assert_eq!(status, 200);
    }
}
