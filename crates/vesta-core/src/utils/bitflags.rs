// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A macro to declare hashable flag sets used inside cache keys.

/// Declares a bitflag set that is `Copy`, `Eq` and `Hash`, so it can be part
/// of a structural cache key.
#[macro_export]
#[doc(hidden)]
macro_rules! vesta_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// An empty set of flags.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Creates a flag set from raw bits. Unknown bits are kept.
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self { bits }
            }

            /// Returns the raw value of the flag set.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Returns `true` if no flag is set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Returns `true` if all flags in `other` are set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if any flag in `other` is set in `self`.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Sets the flags in `other`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Clears the flags in `other`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut remaining = self.bits;
                let mut first = true;

                write!(f, "{} {{ ", stringify!($name))?;
                $(
                    let value: $ty = $flag_value;
                    if value != 0 && (remaining & value) == value {
                        if !first {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag_name))?;
                        remaining &= !value;
                        first = false;
                    }
                )*
                if remaining != 0 {
                    if !first {
                        write!(f, " | ")?;
                    }
                    write!(f, "UNKNOWN({:#x})", remaining)?;
                    first = false;
                }
                if first {
                    write!(f, "EMPTY")?;
                }
                write!(f, " }}")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::vesta_bitflags;

    vesta_bitflags! {
        /// Flags used only by these tests.
        pub struct Stages: u8 {
            const VERTEX = 1 << 0;
            const FRAGMENT = 1 << 1;
            const COMPUTE = 1 << 2;
            const GRAPHICS = Self::VERTEX.bits() | Self::FRAGMENT.bits();
        }
    }

    #[test]
    fn empty_and_default_agree() {
        assert_eq!(Stages::default(), Stages::EMPTY);
        assert!(Stages::EMPTY.is_empty());
        assert_eq!(format!("{:?}", Stages::EMPTY), "Stages { EMPTY }");
    }

    #[test]
    fn combined_constants_print_once() {
        let flags = Stages::VERTEX | Stages::FRAGMENT;
        assert_eq!(flags, Stages::GRAPHICS);
        assert!(flags.contains(Stages::VERTEX));
        assert!(!flags.contains(Stages::COMPUTE));
        assert_eq!(format!("{:?}", flags), "Stages { VERTEX | FRAGMENT }");
    }

    #[test]
    fn insert_remove_and_intersects() {
        let mut flags = Stages::VERTEX;
        flags.insert(Stages::COMPUTE);
        assert!(flags.intersects(Stages::COMPUTE | Stages::FRAGMENT));
        flags.remove(Stages::VERTEX);
        assert_eq!(flags, Stages::COMPUTE);
        assert!(!flags.intersects(Stages::GRAPHICS));
    }

    #[test]
    fn unknown_bits_are_kept_and_reported() {
        let flags = Stages::from_bits_truncate(0b1000_0001);
        assert_eq!(flags.bits(), 0b1000_0001);
        assert_eq!(format!("{:?}", flags), "Stages { VERTEX | UNKNOWN(0x80) }");
    }
}
