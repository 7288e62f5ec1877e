//! PIX BR Code payload codec.
//!
//! Builds the EMV-style copy-paste payload for a static PIX charge and
//! decodes the transaction amount back out of one. Every field is framed as
//! `id (2 chars) + length (2 digits) + value`; the payload ends with a
//! CRC16 checksum framed as field `63`.

use thiserror::Error;

/// City reported in the merchant fields.
const MERCHANT_CITY: &str = "SAO PAULO";

/// Merchant names longer than this are truncated per the payload format.
const MERCHANT_NAME_MAX: usize = 25;

/// Errors decoding a BR Code payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrCodeError {
    #[error("malformed BR Code payload")]
    Malformed,

    #[error("BR Code payload has no amount field")]
    MissingAmount,
}

/// Frame one field as `id + zero-padded length + value`.
fn format_field(id: &str, value: &str) -> String {
    format!("{}{:02}{}", id, value.len(), value)
}

/// CRC16 over the payload (poly 0x1021, init 0xFFFF).
fn crc16(payload: &str) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for byte in payload.bytes() {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Builder for a static PIX BR Code payload.
#[derive(Debug, Clone)]
pub struct BrCodeBuilder {
    pix_key: String,
    amount: String,
    merchant_name: String,
}

impl BrCodeBuilder {
    /// Create a builder for the given key and display amount.
    ///
    /// The amount may use either `,` or `.` as the decimal separator; it is
    /// normalized to `.` in the payload.
    pub fn new(
        pix_key: impl Into<String>,
        amount: impl Into<String>,
        merchant_name: impl Into<String>,
    ) -> Self {
        Self {
            pix_key: pix_key.into(),
            amount: amount.into().replace(',', "."),
            merchant_name: merchant_name.into(),
        }
    }

    /// Build the copy-paste payload, checksum included.
    pub fn build(&self) -> String {
        let payload_format_indicator = "000201";
        let merchant_account_info =
            format_field("00", "br.gov.bcb.pix") + &format_field("01", &self.pix_key);
        let merchant_account = format_field("26", &merchant_account_info);
        let merchant_category_code = "52040000";
        let transaction_currency = "5303986";
        let transaction_amount = format_field("54", &self.amount);
        let country_code = "5802BR";
        let name: String = self.merchant_name.chars().take(MERCHANT_NAME_MAX).collect();
        let merchant_name = format_field("59", &name);
        let merchant_city = format_field("60", MERCHANT_CITY);

        let payload = format!(
            "{payload_format_indicator}{merchant_account}{merchant_category_code}\
             {transaction_currency}{transaction_amount}{country_code}{merchant_name}{merchant_city}"
        );

        format!("{}6304{:04X}", payload, crc16(&payload))
    }
}

/// Decode the transaction amount (field 54) out of a BR Code payload.
pub fn decode_amount(payload: &str) -> Result<f64, BrCodeError> {
    let mut pos = 0;

    while pos + 4 <= payload.len() {
        let id = payload.get(pos..pos + 2).ok_or(BrCodeError::Malformed)?;
        let len: usize = payload
            .get(pos + 2..pos + 4)
            .ok_or(BrCodeError::Malformed)?
            .parse()
            .map_err(|_| BrCodeError::Malformed)?;
        let end = pos + 4 + len;
        let value = payload.get(pos + 4..end).ok_or(BrCodeError::Malformed)?;
        if id == "54" {
            return value
                .replace(',', ".")
                .parse()
                .map_err(|_| BrCodeError::Malformed);
        }
        pos = end;
    }

    Err(BrCodeError::MissingAmount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_field_pads_length() {
        assert_eq!(format_field("54", "45.00"), "540545.00");
        assert_eq!(format_field("00", "br.gov.bcb.pix"), "0014br.gov.bcb.pix");
    }

    #[test]
    fn test_payload_structure() {
        let code = BrCodeBuilder::new("chave@pix.com", "45,00", "PROMPTGEN").build();
        assert!(code.starts_with("000201"));
        assert!(code.contains("br.gov.bcb.pix"));
        assert!(code.contains("540545.00"));
        assert!(code.contains("5802BR"));
        assert!(code.contains("SAO PAULO"));
        // CRC frame: "6304" + 4 hex digits at the very end
        let tail = &code[code.len() - 8..];
        assert!(tail.starts_with("6304"));
        assert!(u16::from_str_radix(&tail[4..], 16).is_ok());
    }

    #[test]
    fn test_crc_is_stable() {
        let a = BrCodeBuilder::new("key", "10.00", "PROMPTGEN").build();
        let b = BrCodeBuilder::new("key", "10.00", "PROMPTGEN").build();
        assert_eq!(a, b);
    }

    #[test]
    fn test_merchant_name_truncated() {
        let long_name = "A VERY LONG MERCHANT NAME THAT EXCEEDS THE CAP";
        let code = BrCodeBuilder::new("key", "10.00", long_name).build();
        assert!(code.contains(&long_name[..MERCHANT_NAME_MAX]));
        assert!(!code.contains(long_name));
    }

    #[test]
    fn test_amount_round_trip() {
        let code = BrCodeBuilder::new("chave@pix.com", "45,00", "PROMPTGEN").build();
        assert_eq!(decode_amount(&code), Ok(45.0));

        let code = BrCodeBuilder::new("chave@pix.com", "9.90", "PROMPTGEN").build();
        assert_eq!(decode_amount(&code), Ok(9.9));
    }

    #[test]
    fn test_decode_amount_missing() {
        assert_eq!(decode_amount("000201"), Err(BrCodeError::MissingAmount));
    }

    #[test]
    fn test_decode_amount_malformed() {
        assert_eq!(decode_amount("54xx"), Err(BrCodeError::Malformed));
        assert_eq!(decode_amount("5409abc"), Err(BrCodeError::Malformed));
    }
}
