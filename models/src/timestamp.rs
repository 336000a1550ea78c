// models/src/timestamp.rs
//! Wrappers for chrono timestamps and calendar dates so they work with
//! bincode 2.x record encoding.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use bincode::{Encode, Decode, BorrowDecode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BincodeDateTime(pub DateTime<Utc>);

impl BincodeDateTime {
    pub fn now() -> Self {
        BincodeDateTime(Utc::now())
    }
}

impl From<DateTime<Utc>> for BincodeDateTime {
    fn from(dt: DateTime<Utc>) -> Self {
        BincodeDateTime(dt)
    }
}

impl From<BincodeDateTime> for DateTime<Utc> {
    fn from(wrapper: BincodeDateTime) -> Self {
        wrapper.0
    }
}

impl fmt::Display for BincodeDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

// bincode 2.x support
impl Encode for BincodeDateTime {
    fn encode<E: bincode::enc::Encoder>(&self, encoder: &mut E) -> Result<(), bincode::error::EncodeError> {
        self.0.timestamp_millis().encode(encoder)
    }
}

impl<CTX> Decode<CTX> for BincodeDateTime {
    fn decode<D: bincode::de::Decoder<Context = CTX>>(decoder: &mut D) -> Result<Self, bincode::error::DecodeError> {
        let millis = i64::decode(decoder)?;
        let dt = DateTime::from_timestamp_millis(millis)
            .ok_or(bincode::error::DecodeError::Other("invalid timestamp millis"))?
            .with_timezone(&Utc);
        Ok(BincodeDateTime(dt))
    }
}

impl<'de, CTX> BorrowDecode<'de, CTX> for BincodeDateTime {
    fn borrow_decode<D: bincode::de::BorrowDecoder<'de, Context = CTX>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        Self::decode(decoder)
    }
}

/// Calendar date without a time of day, encoded as days from the common era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BincodeDate(pub NaiveDate);

impl From<NaiveDate> for BincodeDate {
    fn from(date: NaiveDate) -> Self {
        BincodeDate(date)
    }
}

impl From<BincodeDate> for NaiveDate {
    fn from(wrapper: BincodeDate) -> Self {
        wrapper.0
    }
}

impl fmt::Display for BincodeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d/%m/%Y"))
    }
}

impl Encode for BincodeDate {
    fn encode<E: bincode::enc::Encoder>(&self, encoder: &mut E) -> Result<(), bincode::error::EncodeError> {
        self.0.num_days_from_ce().encode(encoder)
    }
}

impl<CTX> Decode<CTX> for BincodeDate {
    fn decode<D: bincode::de::Decoder<Context = CTX>>(decoder: &mut D) -> Result<Self, bincode::error::DecodeError> {
        let days = i32::decode(decoder)?;
        let date = NaiveDate::from_num_days_from_ce_opt(days)
            .ok_or(bincode::error::DecodeError::Other("invalid date days"))?;
        Ok(BincodeDate(date))
    }
}

impl<'de, CTX> BorrowDecode<'de, CTX> for BincodeDate {
    fn borrow_decode<D: bincode::de::BorrowDecoder<'de, Context = CTX>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        Self::decode(decoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincode::config;
    use chrono::NaiveDate;

    #[test]
    fn should_round_trip_date_through_bincode() {
        let date = BincodeDate(NaiveDate::from_ymd_opt(2004, 2, 29).unwrap());
        let bytes = bincode::encode_to_vec(date, config::standard()).unwrap();
        let (decoded, _): (BincodeDate, usize) =
            bincode::decode_from_slice(&bytes, config::standard()).unwrap();
        assert_eq!(decoded, date);
    }

    #[test]
    fn should_format_date_in_day_month_year_order() {
        let date = BincodeDate(NaiveDate::from_ymd_opt(2004, 2, 29).unwrap());
        assert_eq!(date.to_string(), "29/02/2004");
    }

    #[test]
    fn should_order_datetimes_chronologically() {
        let earlier = BincodeDateTime(DateTime::from_timestamp_millis(1_000).unwrap());
        let later = BincodeDateTime(DateTime::from_timestamp_millis(2_000).unwrap());
        assert!(earlier < later);
    }
}
