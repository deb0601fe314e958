//! Helper methods for the generated `NearToken` and `NearGas` types.
//!
//! Every snapshot gets the same helpers through `impl_token_helpers!`, which
//! the generated module invokes once its `NearToken` is known to be a decimal
//! string and its `NearGas` a plain integer.

/// 1 NEAR = 10^24 yoctoNEAR.
pub const YOCTO_PER_NEAR: u128 = 1_000_000_000_000_000_000_000_000;

/// 1 TGas = 10^12 gas units.
pub const GAS_PER_TGAS: u64 = 1_000_000_000_000;

/// Invoked by each generated snapshot module with its own `types`.
macro_rules! impl_token_helpers {
    ($types:ident) => {
        impl $types::NearToken {
            /// Parse the inner yoctoNEAR decimal string.
            pub fn as_yoctonear(&self) -> ::std::result::Result<u128, ::std::num::ParseIntError> {
                self.0.parse()
            }

            pub fn from_yoctonear(amount: u128) -> Self {
                Self(amount.to_string())
            }

            /// Whole NEAR, saturating at `u128::MAX` yoctoNEAR.
            pub fn from_near(amount: u64) -> Self {
                Self::from_yoctonear(u128::from(amount).saturating_mul($crate::token_helpers::YOCTO_PER_NEAR))
            }

            /// Approximate value in NEAR (useful for display).
            pub fn as_near_f64(&self) -> ::std::result::Result<f64, ::std::num::ParseIntError> {
                Ok(self.as_yoctonear()? as f64 / $crate::token_helpers::YOCTO_PER_NEAR as f64)
            }
        }

        impl $types::NearGas {
            pub fn as_gas(&self) -> u64 {
                self.0
            }

            pub fn from_gas(gas: u64) -> Self {
                Self(gas)
            }

            /// Approximate value in TGas (useful for display).
            pub fn as_tgas(&self) -> f64 {
                self.0 as f64 / $crate::token_helpers::GAS_PER_TGAS as f64
            }

            /// Saturates at `u64::MAX` gas.
            pub fn from_tgas(tgas: u64) -> Self {
                Self(tgas.saturating_mul($crate::token_helpers::GAS_PER_TGAS))
            }
        }

        #[cfg(feature = "near-primitives")]
        impl ::std::convert::TryFrom<$types::NearToken> for ::near_token::NearToken {
            type Error = ::std::num::ParseIntError;

            fn try_from(t: $types::NearToken) -> ::std::result::Result<Self, Self::Error> {
                Ok(::near_token::NearToken::from_yoctonear(t.as_yoctonear()?))
            }
        }

        #[cfg(feature = "near-primitives")]
        impl ::std::convert::From<::near_token::NearToken> for $types::NearToken {
            fn from(t: ::near_token::NearToken) -> Self {
                Self::from_yoctonear(t.as_yoctonear())
            }
        }

        #[cfg(feature = "near-primitives")]
        impl ::std::convert::From<$types::NearGas> for ::near_gas::NearGas {
            fn from(g: $types::NearGas) -> Self {
                ::near_gas::NearGas::from_gas(g.as_gas())
            }
        }

        #[cfg(feature = "near-primitives")]
        impl ::std::convert::From<::near_gas::NearGas> for $types::NearGas {
            fn from(g: ::near_gas::NearGas) -> Self {
                Self::from_gas(g.as_gas())
            }
        }
    };
}

pub(crate) use impl_token_helpers;
