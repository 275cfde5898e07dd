//! Deserializers over raw string values from route params, query strings
//! and form fields.
//!
//! Numbers and booleans are parsed from the text. A list of values feeds
//! sequences whole; anything else reads the first value.

use std::borrow::Cow;

pub(crate) use serde::de::value::Error as ValError;
use serde::de::value::SeqDeserializer;
use serde::de::{Error as DeError, IntoDeserializer, Visitor};
use serde::{forward_to_deserialize_any, Deserialize, Deserializer};

macro_rules! parse_scalars {
    ($($ty:ty => $method:ident,)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValError> {
                let parsed: $ty = self.0.parse().map_err(DeError::custom)?;
                IntoDeserializer::<'de, ValError>::into_deserializer(parsed).$method(visitor)
            }
        )*
    };
}

macro_rules! from_first {
    ($($method:ident,)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValError> {
                self.first()?.$method(visitor)
            }
        )*
    };
}

struct RawValue<'de>(Cow<'de, str>);

impl<'de> IntoDeserializer<'de, ValError> for RawValue<'de> {
    type Deserializer = Self;
    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for RawValue<'de> {
    type Error = ValError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValError> {
        match self.0 {
            Cow::Borrowed(s) => visitor.visit_borrowed_str(s),
            Cow::Owned(s) => visitor.visit_string(s),
        }
    }
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValError> {
        visitor.visit_some(self)
    }
    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ValError> {
        visitor.visit_newtype_struct(self)
    }
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ValError> {
        visitor.visit_enum(IntoDeserializer::<'de, ValError>::into_deserializer(self.0))
    }

    parse_scalars! {
        bool => deserialize_bool,
        u8 => deserialize_u8,
        u16 => deserialize_u16,
        u32 => deserialize_u32,
        u64 => deserialize_u64,
        i8 => deserialize_i8,
        i16 => deserialize_i16,
        i32 => deserialize_i32,
        i64 => deserialize_i64,
        f32 => deserialize_f32,
        f64 => deserialize_f64,
    }
    forward_to_deserialize_any! {
        char str string unit bytes byte_buf unit_struct tuple_struct
        struct identifier tuple ignored_any seq map
    }
}

struct RawValues<'de>(Vec<Cow<'de, str>>);

impl<'de> RawValues<'de> {
    fn first(self) -> Result<RawValue<'de>, ValError> {
        self.0
            .into_iter()
            .next()
            .map(RawValue)
            .ok_or_else(|| DeError::custom("expected at least one value"))
    }
}

impl<'de> Deserializer<'de> for RawValues<'de> {
    type Error = ValError;

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValError> {
        visitor.visit_seq(SeqDeserializer::new(self.0.into_iter().map(RawValue)))
    }
    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, ValError> {
        self.deserialize_seq(visitor)
    }
    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, ValError> {
        self.deserialize_seq(visitor)
    }
    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ValError> {
        visitor.visit_newtype_struct(self)
    }
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValError> {
        visitor.visit_some(self)
    }
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ValError> {
        self.first()?.deserialize_enum(name, variants, visitor)
    }
    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ValError> {
        self.first()?.deserialize_unit_struct(name, visitor)
    }
    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ValError> {
        self.first()?.deserialize_struct(name, fields, visitor)
    }

    from_first! {
        deserialize_any, deserialize_bool, deserialize_u8, deserialize_u16,
        deserialize_u32, deserialize_u64, deserialize_i8, deserialize_i16,
        deserialize_i32, deserialize_i64, deserialize_f32, deserialize_f64,
        deserialize_char, deserialize_str, deserialize_string, deserialize_bytes,
        deserialize_byte_buf, deserialize_unit, deserialize_map,
        deserialize_identifier, deserialize_ignored_any,
    }
}

pub(crate) fn from_str_multi_val<'de, I, T, C>(input: I) -> Result<T, ValError>
where
    I: IntoIterator<Item = C> + 'de,
    T: Deserialize<'de>,
    C: Into<Cow<'de, str>> + 'de,
{
    T::deserialize(RawValues(input.into_iter().map(Into::into).collect()))
}

pub(crate) fn from_str_val<'de, I, T>(input: I) -> Result<T, ValError>
where
    I: Into<Cow<'de, str>>,
    T: Deserialize<'de>,
{
    T::deserialize(RawValue(input.into()))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize, Debug, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    enum Format {
        Json,
        Xml,
    }

    #[test]
    fn test_from_str_val() {
        assert_eq!(from_str_val::<_, u32>("12").unwrap(), 12);
        assert_eq!(from_str_val::<_, String>("json").unwrap(), "json");
        assert_eq!(from_str_val::<_, Format>("xml").unwrap(), Format::Xml);
        assert_eq!(from_str_val::<_, Option<bool>>("true").unwrap(), Some(true));
        assert!(from_str_val::<_, u32>("twelve").is_err());
        assert!(from_str_val::<_, Format>("yaml").is_err());
    }

    #[test]
    fn test_from_str_multi_val() {
        assert_eq!(
            from_str_multi_val::<_, Vec<u8>, _>(vec!["1", "2"]).unwrap(),
            vec![1, 2]
        );
        assert_eq!(
            from_str_multi_val::<_, Format, _>(vec!["json", "xml"]).unwrap(),
            Format::Json
        );
        assert_eq!(
            from_str_multi_val::<_, (String, u8), _>(vec!["a", "2"]).unwrap(),
            ("a".to_owned(), 2)
        );
        assert!(from_str_multi_val::<_, String, &str>(Vec::new()).is_err());
    }
}
