use crate::Result;

/// Initialize logging for a binary embedding the decoder.
///
/// The library itself only emits `tracing` events; installing a subscriber is
/// opt-in through the `subscriber` feature so embedders keep control.
pub fn init(service_name: &str) -> Result<()> {
    let _ = service_name;

    #[cfg(feature = "subscriber")]
    {
        use tracing_subscriber::{fmt, EnvFilter};

        // Default: info for the decoder and the caller, warn for everything else.
        // Can be overridden with `RUST_LOG`.
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("warn,tgwire_core=info,{service_name}=info"))
        });

        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .map_err(|e| crate::Error::Config(format!("logging already initialized: {e}")))?;
    }

    Ok(())
}
