//! Macro for implementing string conversions on tag enums
//!
//! Stage statuses, filter tags and sync modes all travel as lowercase strings
//! (in JSON, environment variables and cache keys). This macro generates one
//! consistent mapping for `as_str`, `Display` and case-insensitive `FromStr`.
//!
//! # Example
//!
//! ```rust
//! use loadplan_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ShipmentState {
//!     Pending,
//!     Shipped,
//! }
//!
//! impl_domain_status_conversions!(ShipmentState {
//!     Pending => "pending",
//!     Shipped => "shipped",
//! });
//!
//! assert_eq!(ShipmentState::Shipped.as_str(), "shipped");
//! assert_eq!("PENDING".parse::<ShipmentState>(), Ok(ShipmentState::Pending));
//! ```

/// Implements `as_str`, Display and FromStr for tag enums
///
/// String representations must be lowercase; parsing lowercases its input
/// before matching.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical lowercase tag
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestStatus {
        Pending,
        InProduction,
        Shipped,
    }

    impl_domain_status_conversions!(TestStatus {
        Pending => "pending",
        InProduction => "in_production",
        Shipped => "shipped",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestStatus::Pending.to_string(), "pending");
        assert_eq!(TestStatus::InProduction.to_string(), "in_production");
        assert_eq!(TestStatus::Shipped.as_str(), "shipped");
    }

    #[test]
    fn test_fromstr_mixed_case_and_whitespace() {
        assert_eq!(TestStatus::from_str("PENDING").unwrap(), TestStatus::Pending);
        assert_eq!(TestStatus::from_str(" In_Production ").unwrap(), TestStatus::InProduction);
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = TestStatus::from_str("invalid");
        assert!(result.unwrap_err().contains("Invalid TestStatus: invalid"));
        assert!(TestStatus::from_str("").is_err());
    }
}
