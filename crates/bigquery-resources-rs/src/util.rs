// used for `#[serde(skip_serializing_if = "is_false")]` attrs
#[inline]
pub(crate) fn is_false(b: &bool) -> bool {
    !*b
}

/// BigQuery encodes 64 bit integers as JSON strings. These helpers serialize as a string,
/// and accept either a string or a bare number when deserializing.
pub(crate) mod int64 {
    use std::fmt;
    use std::marker::PhantomData;
    use std::str::FromStr;

    use serde::de;

    pub(crate) trait Int64: Copy + FromStr + TryFrom<u64> + TryFrom<i64> + itoa::Integer {}

    impl<T> Int64 for T where T: Copy + FromStr + TryFrom<u64> + TryFrom<i64> + itoa::Integer {}

    struct Int64Visitor<T>(PhantomData<T>);

    impl<'de, T: Int64> de::Visitor<'de> for Int64Visitor<T> {
        type Value = T;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer, or a string containing an integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            <T as TryFrom<u64>>::try_from(v)
                .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            <T as TryFrom<i64>>::try_from(v)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    pub(crate) mod optional {
        use std::fmt;
        use std::marker::PhantomData;

        use serde::de;

        use super::{Int64, Int64Visitor};

        pub(crate) fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
        where
            T: Int64,
            S: serde::Serializer,
        {
            match value {
                Some(int) => serializer.serialize_str(itoa::Buffer::new().format(*int)),
                None => serializer.serialize_none(),
            }
        }

        pub(crate) fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
        where
            T: Int64,
            D: serde::Deserializer<'de>,
        {
            struct OptionalVisitor<T>(PhantomData<T>);

            impl<'de, T: Int64> de::Visitor<'de> for OptionalVisitor<T> {
                type Value = Option<T>;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("an optional int64")
                }

                fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                    Ok(None)
                }

                fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                    Ok(None)
                }

                fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
                where
                    D: serde::Deserializer<'de>,
                {
                    deserializer
                        .deserialize_any(Int64Visitor(PhantomData))
                        .map(Some)
                }
            }

            deserializer.deserialize_option(OptionalVisitor(PhantomData))
        }
    }
}
