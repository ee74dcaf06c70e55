//! UPI payment links and QR codes for manual checkout.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

use moonlit_core::Price;

use crate::config::PaymentConfig;

/// Smallest rendered QR code edge, in pixels.
const QR_MIN_SIZE: u32 = 300;

/// Errors rendering a payment QR code.
#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(String),
}

/// A `upi://pay` deep link for `amount`, with `note` as the transaction note.
///
/// UPI apps show the payee name and note to the customer; both are
/// percent-encoded.
#[must_use]
pub fn upi_link(config: &PaymentConfig, amount: Price, note: &str) -> String {
    format!(
        "upi://pay?pa={}&pn={}&am={}&tn={}&cu=INR",
        config.upi_id,
        urlencoding::encode(&config.merchant_name),
        amount.plain(),
        urlencoding::encode(note),
    )
}

/// A QR code of `link` as an SVG `data:` URI, ready for an `<img>` tag.
///
/// Scanning it opens the UPI app with the payee, amount, and note filled in.
///
/// # Errors
///
/// Returns `QrError::Encode` if `link` is too long for a QR code.
pub fn qr_data_uri(link: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(link.as_bytes(), EcLevel::H)
        .map_err(|e| QrError::Encode(e.to_string()))?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .quiet_zone(true)
        .build();

    Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(image)))
}

/// Transaction note tying a transfer to the paying customer.
#[must_use]
pub fn transaction_note(customer_id: &str) -> String {
    format!("ORDER-{customer_id}")
}

/// Whether `utr` is a 12-digit UPI transaction reference.
#[must_use]
pub fn is_valid_utr(utr: &str) -> bool {
    utr.len() == 12 && utr.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn config() -> PaymentConfig {
        PaymentConfig {
            upi_id: "payments@moonlit".to_string(),
            merchant_name: "Moonlit Promise".to_string(),
            qr_image: None,
        }
    }

    #[test]
    fn test_upi_link() {
        let link = upi_link(
            &config(),
            Price::inr(Decimal::new(59999, 2)),
            &transaction_note("80351110224678912"),
        );
        assert_eq!(
            link,
            "upi://pay?pa=payments@moonlit&pn=Moonlit%20Promise&am=599.99&tn=ORDER-80351110224678912&cu=INR"
        );
    }

    #[test]
    fn test_upi_link_pads_amount() {
        let link = upi_link(&config(), Price::inr(Decimal::new(300, 0)), "x");
        assert!(link.contains("&am=300.00&"));
    }

    #[test]
    fn test_qr_code_embeds_an_svg() {
        let link = upi_link(&config(), Price::inr(Decimal::new(59999, 2)), "ORDER-1");
        let uri = qr_data_uri(&link).unwrap_or_else(|e| panic!("{e}"));

        let encoded = uri
            .strip_prefix("data:image/svg+xml;base64,")
            .unwrap_or_else(|| panic!("not an SVG data URI: {uri}"));
        let decoded = STANDARD
            .decode(encoded)
            .unwrap_or_else(|e| panic!("{e}"));
        let image = String::from_utf8(decoded).unwrap_or_else(|e| panic!("{e}"));
        assert!(image.contains("<svg"));
    }

    #[test]
    fn test_qr_code_differs_per_amount() {
        let small = upi_link(&config(), Price::inr(Decimal::new(100, 0)), "ORDER-1");
        let large = upi_link(&config(), Price::inr(Decimal::new(900, 0)), "ORDER-1");
        assert_ne!(
            qr_data_uri(&small).unwrap_or_else(|e| panic!("{e}")),
            qr_data_uri(&large).unwrap_or_else(|e| panic!("{e}"))
        );
    }

    #[test]
    fn test_oversized_link_is_an_error() {
        assert!(qr_data_uri(&"x".repeat(8000)).is_err());
    }

    #[test]
    fn test_utr_format() {
        assert!(is_valid_utr("123456789012"));
        assert!(!is_valid_utr("12345678901"));
        assert!(!is_valid_utr("12345678901a"));
        assert!(!is_valid_utr(""));
    }
}
