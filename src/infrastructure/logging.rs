use crate::core::constants::log as log_consts;
use env_logger::{Builder, Env};

/// 初始化日志，`RUST_LOG` 优先，其次为 --verbose 对应的级别
pub fn init_logger(verbose: bool) {
    let default_level = if verbose {
        log_consts::VERBOSE_LOG_LEVEL
    } else {
        log_consts::DEFAULT_LOG_LEVEL
    };

    let _ = Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .format_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_idempotent() {
        init_logger(true);
        init_logger(false);
        log::debug!("logger initialised twice without panicking");
    }
}
