// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::ModelsError;
use bonding_hash::{Hash, HashDeserializer, HashSerializer, HASH_SIZE_BYTES};
use bonding_serialization::{Deserializer, SerializeError, Serializer};
use bonding_signature::PublicKey;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use std::str::FromStr;

/// Size of a serialized address, in bytes
pub const ADDRESS_SIZE_BYTES: usize = HASH_SIZE_BYTES;

macro_rules! address_type {
    ($name:ident, $serializer:ident, $deserializer:ident, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name(Hash);

        impl $name {
            /// String prefix of this address kind
            pub const PREFIX: &'static str = $prefix;

            /// Underlying hash
            pub fn hash(&self) -> &Hash {
                &self.0
            }

            /// Raw bytes, fixed width so that they can be concatenated in store keys
            pub fn to_bytes(&self) -> &[u8; ADDRESS_SIZE_BYTES] {
                self.0.to_bytes()
            }

            /// Builds the address from raw bytes
            pub fn from_bytes(data: &[u8; ADDRESS_SIZE_BYTES]) -> Self {
                Self(Hash::from_bytes(data))
            }

            /// Builds the address from a byte slice, failing on a wrong length
            pub fn from_slice(data: &[u8]) -> Result<Self, ModelsError> {
                let array: &[u8; ADDRESS_SIZE_BYTES] = data.try_into().map_err(|_| {
                    ModelsError::DeserializeError(format!(
                        "{} must be {} bytes long",
                        stringify!($name),
                        ADDRESS_SIZE_BYTES
                    ))
                })?;
                Ok(Self::from_bytes(array))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}{}", Self::PREFIX, self.0.to_bs58_check())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self)
            }
        }

        impl FromStr for $name {
            type Err = ModelsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.strip_prefix(Self::PREFIX) {
                    Some(encoded) => Ok(Self(Hash::from_bs58_check(encoded)?)),
                    None => Err(ModelsError::WrongPrefix(
                        Self::PREFIX.to_string(),
                        s.chars().take(Self::PREFIX.len()).collect(),
                    )),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                if s.is_human_readable() {
                    s.collect_str(&self.to_string())
                } else {
                    s.serialize_bytes(self.to_bytes())
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<$name, D::Error> {
                struct AddressVisitor;

                impl<'de> ::serde::de::Visitor<'de> for AddressVisitor {
                    type Value = $name;

                    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                        write!(formatter, "{} + base58::encode(hash) or raw bytes", $prefix)
                    }

                    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                    where
                        E: ::serde::de::Error,
                    {
                        $name::from_str(v).map_err(E::custom)
                    }

                    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                    where
                        E: ::serde::de::Error,
                    {
                        $name::from_slice(v).map_err(E::custom)
                    }
                }

                if d.is_human_readable() {
                    d.deserialize_str(AddressVisitor)
                } else {
                    d.deserialize_bytes(AddressVisitor)
                }
            }
        }

        #[doc = "Serializer for `"]
        #[doc = stringify!($name)]
        #[doc = "`"]
        #[derive(Default, Clone)]
        pub struct $serializer {
            hash_serializer: HashSerializer,
        }

        impl $serializer {
            /// Creates the serializer
            pub const fn new() -> Self {
                Self {
                    hash_serializer: HashSerializer::new(),
                }
            }
        }

        impl Serializer<$name> for $serializer {
            fn serialize(&self, value: &$name, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                self.hash_serializer.serialize(&value.0, buffer)
            }
        }

        #[doc = "Deserializer for `"]
        #[doc = stringify!($name)]
        #[doc = "`"]
        #[derive(Default, Clone)]
        pub struct $deserializer {
            hash_deserializer: HashDeserializer,
        }

        impl $deserializer {
            /// Creates the deserializer
            pub const fn new() -> Self {
                Self {
                    hash_deserializer: HashDeserializer::new(),
                }
            }
        }

        impl Deserializer<$name> for $deserializer {
            fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                &self,
                buffer: &'a [u8],
            ) -> IResult<&'a [u8], $name, E> {
                context(concat!("Failed ", stringify!($name), " deserialization"), |input| {
                    self.hash_deserializer.deserialize(input)
                })(buffer)
                .map(|(rest, hash)| (rest, $name(hash)))
            }
        }
    };
}

address_type!(
    Address,
    AddressSerializer,
    AddressDeserializer,
    "AU",
    "Account address: holds balances and delegates."
);
address_type!(
    ValidatorAddress,
    ValidatorAddressSerializer,
    ValidatorAddressDeserializer,
    "AV",
    "Operator address of a validator. Shares its bytes with the operator account."
);
address_type!(
    ConsensusAddress,
    ConsensusAddressSerializer,
    ConsensusAddressDeserializer,
    "AC",
    "Address derived from a validator consensus public key, as reported in evidence."
);

impl Address {
    /// Account controlled by the given key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Address(public_key.hash())
    }

    /// Module account: no key controls it, only the state machine moves its funds
    /// ```
    /// # use bonding_models::Address;
    /// let pool = Address::from_module_name("bonded_tokens_pool");
    /// assert_eq!(pool, Address::from_module_name("bonded_tokens_pool"));
    /// assert_ne!(pool, Address::from_module_name("not_bonded_tokens_pool"));
    /// ```
    pub fn from_module_name(name: &str) -> Self {
        Address(Hash::compute_from(format!("module/{}", name).as_bytes()))
    }
}

impl ConsensusAddress {
    /// Consensus address of a consensus public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        ConsensusAddress(public_key.hash())
    }
}

impl From<ValidatorAddress> for Address {
    fn from(value: ValidatorAddress) -> Self {
        Address(value.0)
    }
}

impl From<Address> for ValidatorAddress {
    fn from(value: Address) -> Self {
        ValidatorAddress(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonding_signature::KeyPair;

    #[test]
    fn test_address_string_roundtrip_and_prefix() {
        let keypair = KeyPair::generate();
        let address = Address::from_public_key(&keypair.get_public_key());
        let encoded = address.to_string();
        assert!(encoded.starts_with("AU"));
        assert_eq!(Address::from_str(&encoded).unwrap(), address);

        let operator = ValidatorAddress::from(address);
        assert!(ValidatorAddress::from_str(&encoded).is_err());
        assert_eq!(
            ValidatorAddress::from_str(&operator.to_string()).unwrap(),
            operator
        );
        assert_eq!(Address::from(operator), address);
    }

    #[test]
    fn test_consensus_address_serde() {
        let keypair = KeyPair::generate();
        let address = ConsensusAddress::from_public_key(&keypair.get_public_key());
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(
            serde_json::from_str::<ConsensusAddress>(&json).unwrap(),
            address
        );
        assert!(ConsensusAddress::from_slice(&[0u8; 3]).is_err());
    }
}
