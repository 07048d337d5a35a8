#[cfg(test)]
mod tests {
    use crate::config::{ChatConfig, PONG_WAIT, WRITE_WAIT};
    use crate::error::ChatError;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.write_wait, WRITE_WAIT);
        assert_eq!(config.pong_wait, Duration::from_secs(60));
        assert_eq!(config.ping_period, Duration::from_secs(54));
        assert_eq!(config.max_message_size, 512);
        assert_eq!(config.send_queue_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pong_wait_rederives_ping_period() {
        let config = ChatConfig::default().with_pong_wait(Duration::from_secs(10));
        assert_eq!(config.ping_period, Duration::from_secs(9));
        assert!(config.ping_period < config.pong_wait);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ping_period_must_be_shorter_than_pong_wait() {
        let config = ChatConfig::default().with_ping_period(PONG_WAIT);
        assert!(matches!(config.validate(), Err(ChatError::Config(_))));

        let config = ChatConfig::default().with_ping_period(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = ChatConfig::default().with_send_queue_capacity(0);
        assert!(config.validate().is_err());

        let config = ChatConfig::default().with_hub_queue_capacity(0);
        assert!(config.validate().is_err());
    }
}
