//! Macro for implementing Display and FromStr for wire-name enums
//!
//! Enums that travel as strings (resource kinds, digest algorithms) share a
//! single implementation: lowercase output and case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use courier_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum DeliveryMode {
//!     Wrapped,
//!     Raw,
//! }
//!
//! impl_domain_enum_conversions!(DeliveryMode {
//!     Wrapped => "wrapped",
//!     Raw => "raw",
//! });
//!
//! assert_eq!(DeliveryMode::Raw.to_string(), "raw");
//! assert_eq!("WRAPPED".parse::<DeliveryMode>(), Ok(DeliveryMode::Wrapped));
//! ```

/// Implements Display and FromStr traits for wire-name enums
///
/// - Display writes the mapped lowercase string
/// - FromStr parses case-insensitively and names the enum in its error
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
