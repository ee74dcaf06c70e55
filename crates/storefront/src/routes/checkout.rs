//! Checkout route handlers.
//!
//! Two ways to pay:
//! - Cash on delivery, once the phone number is confirmed by OTP in this
//!   session
//! - Manual UPI transfer, with a screenshot of the payment as proof
//!
//! Both create the order from the cart in one transaction and send the
//! customer to the order page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use moonlit_core::{PaymentMethod, Phone, Pincode, Price};

use super::Nav;
use crate::db::{CartRepository, NewOrder, OrderRepository, PlacedOrder, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CartLine, CurrentUser, cart_total, keys};
use crate::services::otp::OtpError;
use crate::services::payment::{is_valid_utr, qr_data_uri, transaction_note, upi_link};
use crate::services::{ProofUpload, UploadError, notify};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 500;

#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub nav: Nav,
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub pincode: String,
    /// Phone already confirmed by OTP in this session.
    pub verified_phone: Option<String>,
    pub upi_id: String,
    pub upi_link: String,
    /// QR code of `upi_link`, or the published static QR image.
    pub qr_image: Option<String>,
}

/// Contact details as submitted.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub pincode: String,
}

/// Contact details after validation.
#[derive(Debug, Clone)]
pub struct Contact {
    pub full_name: String,
    pub phone: Phone,
    pub address: String,
    pub pincode: Pincode,
}

impl ContactForm {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` naming the first invalid field.
    pub fn validate(&self) -> Result<Contact> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() || full_name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::BadRequest("Please enter your full name".into()));
        }
        let address = self.address.trim();
        if address.is_empty() || address.chars().count() > MAX_ADDRESS_LEN {
            return Err(AppError::BadRequest("Please enter your delivery address".into()));
        }
        let phone = Phone::parse(&self.phone)
            .map_err(|_| AppError::BadRequest("Please enter a valid 10-digit mobile number".into()))?;
        let pincode = Pincode::parse(&self.pincode)
            .map_err(|_| AppError::BadRequest("Please enter a valid 6-digit pincode".into()))?;

        Ok(Contact {
            full_name: full_name.to_string(),
            phone,
            address: address.to_string(),
            pincode,
        })
    }
}

/// Body of `POST /checkout/otp/request`.
#[derive(Debug, Deserialize)]
pub struct OtpRequestBody {
    pub phone: String,
}

/// Body of `POST /checkout/otp/verify`.
#[derive(Debug, Deserialize)]
pub struct OtpVerifyBody {
    pub phone: String,
    pub code: String,
}

/// JSON reply of the OTP endpoints.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OtpResponse {
    pub success: bool,
    pub message: String,
}

fn otp_reply(status: StatusCode, success: bool, message: impl Into<String>) -> Response {
    (
        status,
        Json(OtpResponse {
            success,
            message: message.into(),
        }),
    )
        .into_response()
}

fn otp_error_reply(err: &OtpError) -> Response {
    let status = match err {
        OtpError::TooManyRequests | OtpError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
        e if e.is_user_facing() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = if err.is_user_facing() {
        err.to_string()
    } else {
        warn!(error = %err, "OTP operation failed");
        "Could not send the code right now. Please try again.".to_string()
    };
    otp_reply(status, false, message)
}

async fn verified_phone(session: &Session) -> Option<String> {
    session.get(keys::VERIFIED_PHONE).await.ok().flatten()
}

/// The submitted phone must be the one verified in this session.
async fn require_verified_phone(session: &Session, phone: &Phone) -> Result<()> {
    if verified_phone(session).await.as_deref() == Some(phone.as_str()) {
        return Ok(());
    }
    Err(AppError::BadRequest(
        "Phone number not verified. Please verify with the code we sent.".into(),
    ))
}

/// One verification per order. Runs after the order is committed, so a
/// session failure is logged rather than returned.
async fn clear_verified_phone(session: &Session) {
    if let Err(e) = session.remove::<String>(keys::VERIFIED_PHONE).await {
        warn!(error = %e, "Failed to clear verified phone");
    }
}

/// Checkout page. An empty cart goes back to the shop.
///
/// # Errors
///
/// Returns an error if the cart or customer query fails.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Response> {
    let lines = CartRepository::new(state.pool()).lines(&user.id).await?;
    if lines.is_empty() {
        return Ok(Redirect::to("/shop").into_response());
    }
    let total = cart_total(&lines);
    let customer = UserRepository::new(state.pool()).get(&user.id).await?;
    let payment = &state.config().payment;

    let (full_name, phone, address, pincode) = customer
        .map(|c| (c.full_name, c.phone, c.address, c.pincode))
        .unwrap_or_default();

    let link = upi_link(payment, total, &transaction_note(user.id.as_str()));
    let qr_image = match qr_data_uri(&link) {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!(error = %e, "Failed to render payment QR code");
            payment.qr_image.clone()
        }
    };

    Ok(CheckoutTemplate {
        upi_link: link,
        upi_id: payment.upi_id.clone(),
        qr_image,
        verified_phone: verified_phone(&session).await,
        full_name: full_name.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        address: address.unwrap_or_default(),
        pincode: pincode.unwrap_or_default(),
        nav: Nav::load(&state, Some(user)).await,
        lines,
        total,
    }
    .into_response())
}

/// Send a COD verification code.
///
/// # Route
///
/// `POST /checkout/otp/request` with JSON `{phone}`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn otp_request(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<OtpRequestBody>,
) -> Response {
    let Ok(phone) = Phone::parse(&body.phone) else {
        return otp_reply(
            StatusCode::BAD_REQUEST,
            false,
            "Please enter a valid 10-digit mobile number",
        );
    };

    match state.otp().request(&phone).await {
        Ok(()) => otp_reply(StatusCode::OK, true, format!("Code sent to {}", phone.masked())),
        Err(e) => otp_error_reply(&e),
    }
}

/// Check a COD verification code and remember the phone in the session.
///
/// # Route
///
/// `POST /checkout/otp/verify` with JSON `{phone, code}`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn otp_verify(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(body): Json<OtpVerifyBody>,
) -> Response {
    let Ok(phone) = Phone::parse(&body.phone) else {
        return otp_reply(
            StatusCode::BAD_REQUEST,
            false,
            "Please enter a valid 10-digit mobile number",
        );
    };

    if let Err(e) = state.otp().verify(&phone, &body.code).await {
        return otp_error_reply(&e);
    }

    if let Err(e) = session.insert(keys::VERIFIED_PHONE, phone.as_str()).await {
        warn!(error = %e, "Failed to store verified phone");
        return otp_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            false,
            "Could not save verification. Please try again.",
        );
    }

    otp_reply(StatusCode::OK, true, "Phone number verified")
}

fn finish(state: &AppState, placed: &PlacedOrder, transaction_ref: Option<&str>) -> Redirect {
    let order = &placed.order;
    let track_url = state.config().track_url(&order.order_number);
    notify::order_placed(
        state.notifier(),
        order,
        &placed.items,
        &track_url,
        transaction_ref,
    );
    Redirect::to(&format!("/orders/{}", order.order_number))
}

fn new_order(user: &CurrentUser, contact: Contact, method: PaymentMethod) -> NewOrder {
    NewOrder {
        user_id: user.id.clone(),
        full_name: contact.full_name,
        phone: contact.phone,
        address: contact.address,
        pincode: contact.pincode,
        payment_method: method,
        phone_verified: false,
        proof_path: None,
        transaction_ref: None,
    }
}

/// Place a cash-on-delivery order.
///
/// The submitted phone must match the one verified by OTP in this session.
///
/// # Errors
///
/// Returns 400 for invalid details, an unverified phone, or an empty cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn place_cod(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<ContactForm>,
) -> Result<Redirect> {
    let contact = form.validate()?;

    require_verified_phone(&session, &contact.phone).await?;

    let mut new = new_order(&user, contact, PaymentMethod::Cod);
    new.phone_verified = true;

    let placed = OrderRepository::new(state.pool()).create_from_cart(&new).await?;

    clear_verified_phone(&session).await;

    info!(order_number = %placed.order.order_number, "COD order placed");
    Ok(finish(&state, &placed, None))
}

/// Fields of the manual checkout form.
#[derive(Debug, Default)]
struct ManualForm {
    contact: ContactForm,
    utr: Option<String>,
    proof: Option<(String, String, Vec<u8>)>,
}

async fn read_manual_form(mut multipart: Multipart) -> Result<ManualForm> {
    let bad = |_| AppError::BadRequest("Upload failed or too large (max 5 MB)".into());
    let mut form = ManualForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "proof" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad)?;
                form.proof = Some((file_name, content_type, bytes.to_vec()));
            }
            "full_name" => form.contact.full_name = field.text().await.map_err(bad)?,
            "phone" => form.contact.phone = field.text().await.map_err(bad)?,
            "address" => form.contact.address = field.text().await.map_err(bad)?,
            "pincode" => form.contact.pincode = field.text().await.map_err(bad)?,
            "utr" => {
                let utr = field.text().await.map_err(bad)?;
                let utr = utr.trim();
                if !utr.is_empty() {
                    form.utr = Some(utr.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Place a manual (UPI) order with proof of payment.
///
/// # Errors
///
/// Returns 400 for invalid details, a malformed UTR, a missing or invalid
/// proof, or an empty cart; 409 if the UTR was already submitted.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn place_manual(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Redirect> {
    let form = read_manual_form(multipart).await?;
    let contact = form.contact.validate()?;

    if let Some(utr) = &form.utr
        && !is_valid_utr(utr)
    {
        return Err(AppError::BadRequest(
            "Transaction reference (UTR) must be 12 digits".into(),
        ));
    }

    if CartRepository::new(state.pool()).count(&user.id).await? == 0 {
        return Err(AppError::BadRequest("Your cart is empty".into()));
    }

    let Some((file_name, content_type, bytes)) = form.proof else {
        return Err(UploadError::Missing.into());
    };
    let stored = state
        .proofs()
        .store(ProofUpload {
            file_name: &file_name,
            content_type: &content_type,
            bytes: &bytes,
        })
        .await?;

    let mut new = new_order(&user, contact, PaymentMethod::Manual);
    new.proof_path = Some(stored.clone());
    new.transaction_ref.clone_from(&form.utr);

    let placed = match OrderRepository::new(state.pool()).create_from_cart(&new).await {
        Ok(placed) => placed,
        Err(e) => {
            state.proofs().discard(&stored).await;
            return Err(e.into());
        }
    };

    info!(order_number = %placed.order.order_number, proof = %stored, "Manual order placed");
    Ok(finish(&state, &placed, form.utr.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::session::testing::{fresh_session, unavailable_session};

    fn phone(s: &str) -> Phone {
        Phone::parse(s).unwrap_or_else(|e| panic!("{e}"))
    }

    #[tokio::test]
    async fn test_cod_requires_the_verified_phone() {
        let session = fresh_session();
        let submitted = phone("9876543210");

        let unverified = require_verified_phone(&session, &submitted).await;
        assert!(matches!(unverified, Err(AppError::BadRequest(_))));

        session
            .insert(keys::VERIFIED_PHONE, "9123456780")
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        let other = require_verified_phone(&session, &submitted).await;
        assert!(matches!(other, Err(AppError::BadRequest(_))));

        session
            .insert(keys::VERIFIED_PHONE, submitted.as_str())
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(require_verified_phone(&session, &submitted).await.is_ok());

        clear_verified_phone(&session).await;
        let spent = require_verified_phone(&session, &submitted).await;
        assert!(matches!(spent, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_clearing_verified_phone_survives_store_outage() {
        let session = unavailable_session();
        clear_verified_phone(&session).await;
        assert_eq!(verified_phone(&session).await, None);
    }

    fn form() -> ContactForm {
        ContactForm {
            full_name: "  Asha Rao ".into(),
            phone: "+91 98765 43210".into(),
            address: "12 MG Road, Bengaluru".into(),
            pincode: "560001".into(),
        }
    }

    #[test]
    fn test_contact_is_normalized() {
        let contact = form().validate().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(contact.full_name, "Asha Rao");
        assert_eq!(contact.phone.as_str(), "9876543210");
        assert_eq!(contact.pincode.as_str(), "560001");
    }

    #[test]
    fn test_contact_rejects_bad_fields() {
        let cases = [
            ContactForm {
                full_name: " ".into(),
                ..form()
            },
            ContactForm {
                address: String::new(),
                ..form()
            },
            ContactForm {
                phone: "12345".into(),
                ..form()
            },
            ContactForm {
                pincode: "060001".into(),
                ..form()
            },
        ];
        for case in cases {
            assert!(matches!(case.validate(), Err(AppError::BadRequest(_))), "{case:?}");
        }
    }

    #[test]
    fn test_otp_error_statuses() {
        assert_eq!(
            otp_error_reply(&OtpError::TooManyRequests).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            otp_error_reply(&OtpError::Expired).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            otp_error_reply(&OtpError::Delivery("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
