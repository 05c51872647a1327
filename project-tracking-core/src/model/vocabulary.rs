use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::VariantNames;

/// Format of run dates and job timestamps.
pub const DATE_LONG_FMT: &str = "%Y-%m-%d %H:%M:%S";
/// Format of kit expiration dates.
pub const DATE_FMT: &str = "%Y-%m-%d";

pub const RUN_PROCESSING: &str = "run_processing";
pub const TRANSFER: &str = "transfer";
pub const GENPIPES: &str = "genpipes";

/// Offset reported for every readset handed to pipelines.
pub const QUALITY_OFFSET: &str = "33";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid value for '{enum_name}'. Valid values are: {valid}")]
pub struct EnumValueError {
    pub value: String,
    pub enum_name: &'static str,
    pub valid: String,
}

/// A closed set of values accepted from request payloads.
pub trait VocabularyEnum: FromStr + VariantNames + Sized {
    const NAME: &'static str;

    /// # Errors
    fn parse_value(value: &str) -> Result<Self, EnumValueError> {
        value.trim().parse().map_err(|_| EnumValueError {
            value: value.to_string(),
            enum_name: Self::NAME,
            valid: Self::VARIANTS.join(", "),
        })
    }
}

/// Stores a type as its `Display` text and reads it back through `FromStr`.
#[cfg(feature = "backend")]
macro_rules! text_column {
    ($name:ty) => {
        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::sqlite::Sqlite> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::sqlite::Sqlite>,
            ) -> diesel::serialize::Result {
                out.set_value(self.to_string());
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::sqlite::Sqlite>
            for $name
        {
            fn from_sql(
                bytes: <diesel::sqlite::Sqlite as diesel::backend::Backend>::RawValue<'_>,
            ) -> diesel::deserialize::Result<Self> {
                let raw = <String as diesel::deserialize::FromSql<
                    diesel::sql_types::Text,
                    diesel::sqlite::Sqlite,
                >>::from_sql(bytes)?;

                Ok(raw.parse()?)
            }
        }
    };
}

#[cfg(not(feature = "backend"))]
macro_rules! text_column {
    ($name:ty) => {};
}

macro_rules! vocabulary_enum {
    ($name:ident, $label:literal, [$($variant:ident),+ $(,)?]) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Serialize,
            Deserialize,
            strum::Display,
            strum::EnumString,
            strum::VariantNames,
            strum::VariantArray,
        )]
        #[cfg_attr(feature = "backend", derive(diesel::expression::AsExpression, diesel::deserialize::FromSqlRow))]
        #[cfg_attr(feature = "backend", diesel(sql_type = diesel::sql_types::Text))]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
        pub enum $name {
            $($variant),+
        }

        text_column!($name);

        impl VocabularyEnum for $name {
            const NAME: &'static str = $label;
        }
    };
}

vocabulary_enum!(NucleicAcidType, "nucleic_acid_type", [Dna, Rna]);
vocabulary_enum!(SequencingType, "sequencing_type", [SingleEnd, PairedEnd]);
vocabulary_enum!(State, "state", [Valid, OnHold, Invalid, Delivered]);
vocabulary_enum!(
    Status,
    "status",
    [Pending, Running, Done, Completed, Failed, OutOfMemory, Cancelled]
);
vocabulary_enum!(
    MetricFlag,
    "flag",
    [Pass, Warning, Fail, Failed, Missing, NotApplicable]
);
vocabulary_enum!(Aggregate, "aggregate", [Sum, Average, N]);

impl Default for State {
    fn default() -> Self {
        Self::Valid
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    strum::VariantArray,
)]
#[cfg_attr(feature = "backend", derive(diesel::expression::AsExpression, diesel::deserialize::FromSqlRow))]
#[cfg_attr(feature = "backend", diesel(sql_type = diesel::sql_types::Text))]
pub enum Lane {
    #[serde(rename = "1")]
    #[strum(serialize = "1")]
    One,
    #[serde(rename = "2")]
    #[strum(serialize = "2")]
    Two,
    #[serde(rename = "3")]
    #[strum(serialize = "3")]
    Three,
    #[serde(rename = "4")]
    #[strum(serialize = "4")]
    Four,
    #[serde(rename = "5")]
    #[strum(serialize = "5")]
    Five,
    #[serde(rename = "6")]
    #[strum(serialize = "6")]
    Six,
    #[serde(rename = "7")]
    #[strum(serialize = "7")]
    Seven,
    #[serde(rename = "8")]
    #[strum(serialize = "8")]
    Eight,
}

text_column!(Lane);

impl VocabularyEnum for Lane {
    const NAME: &'static str = "lane";
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("DNA", NucleicAcidType::Dna)]
    #[case("rna", NucleicAcidType::Rna)]
    fn nucleic_acid_type_parses_case_insensitively(
        #[case] raw: &str,
        #[case] expected: NucleicAcidType,
    ) {
        assert_eq!(NucleicAcidType::parse_value(raw).unwrap(), expected);
    }

    #[test]
    fn invalid_value_lists_valid_ones() {
        let err = Status::parse_value("SLEEPING").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'SLEEPING' is not a valid value for 'status'. Valid values are: PENDING, RUNNING, \
             DONE, COMPLETED, FAILED, OUT_OF_MEMORY, CANCELLED"
        );
    }

    #[test]
    fn serialized_names_match_vocabulary() {
        assert_eq!(
            serde_json::to_value(SequencingType::PairedEnd).unwrap(),
            "PAIRED_END"
        );
        assert_eq!(serde_json::to_value(Lane::Three).unwrap(), "3");
        assert_eq!(Lane::parse_value("8").unwrap(), Lane::Eight);
        assert_eq!(MetricFlag::NotApplicable.to_string(), "NOT_APPLICABLE");
    }
}
