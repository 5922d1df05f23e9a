//! Macros for bridge error handling.
//!
//! Provides convenience macros for creating and returning
//! [`crate::error::BridgeError`] instances with reduced boilerplate.

/// Creates a [`crate::error::BridgeError`] from error kind and description.
///
/// Accepts an optional dynamic detail and an optional source error.
#[macro_export]
macro_rules! bridge_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::BridgeError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::BridgeError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::BridgeError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::BridgeError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates and returns a [`crate::error::BridgeError`] from the current
/// function.
///
/// Combines error creation with early return for error conditions that should
/// immediately terminate execution. Supports the same optional detail and
/// source arguments as [`bridge_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::bridge_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::bridge_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::bridge_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::bridge_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
