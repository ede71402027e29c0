// crates/wayfarer-server/src/adapters/payments.rs
// Payments adapter: Stripe REST API (form-encoded requests)

use crate::args::Arguments;
use crate::catalogue::Operation;
use crate::config::PaymentsCredentials;
use crate::dispatch::{Adapter, Output};
use crate::error::Result;
use crate::http::{ApiRequest, ApiTransport, HttpTransport};
use async_trait::async_trait;
use serde_json::{Map, Value};
use strum::{AsRefStr, EnumIter, EnumString};
use wayfarer_types::{FieldSpec, FieldType};

pub const STRIPE_API_BASE: &str = "https://api.stripe.com/";

/// Page size used by `list_products` when no limit is given
pub const DEFAULT_PRODUCT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PaymentsOp {
    CreatePaymentIntent,
    GetPaymentIntent,
    CreateCustomer,
    GetCustomer,
    CreateSubscription,
    ListProducts,
    RefundPayment,
}

impl Operation for PaymentsOp {
    fn description(self) -> &'static str {
        match self {
            PaymentsOp::CreatePaymentIntent => {
                "Create a payment intent for a booking deposit or fee. Amount is in the smallest currency unit."
            }
            PaymentsOp::GetPaymentIntent => "Retrieve a payment intent by ID.",
            PaymentsOp::CreateCustomer => "Create a customer record.",
            PaymentsOp::GetCustomer => "Retrieve a customer by ID.",
            PaymentsOp::CreateSubscription => "Subscribe a customer to a recurring price.",
            PaymentsOp::ListProducts => "List products (programs and packages). Default limit 10.",
            PaymentsOp::RefundPayment => {
                "Refund a payment intent in full, or partially when an amount is given."
            }
        }
    }

    fn input_shape(self) -> Vec<FieldSpec> {
        use FieldType::*;
        match self {
            PaymentsOp::CreatePaymentIntent => vec![
                FieldSpec::required("amount", Integer, "Amount in the smallest currency unit (e.g. cents)"),
                FieldSpec::required("currency", String, "Three-letter ISO currency code, e.g. usd"),
                FieldSpec::optional("customer", String, "Customer ID to attach"),
                FieldSpec::optional("description", String, "Description shown on the payment"),
                FieldSpec::optional("metadata", Object, "Key-value metadata"),
            ],
            PaymentsOp::GetPaymentIntent => vec![FieldSpec::required(
                "payment_intent_id",
                String,
                "Payment intent ID (pi_...)",
            )],
            PaymentsOp::CreateCustomer => vec![
                FieldSpec::required("email", String, "Customer email"),
                FieldSpec::optional("name", String, "Full name"),
                FieldSpec::optional("phone", String, "Phone number"),
                FieldSpec::optional("metadata", Object, "Key-value metadata"),
            ],
            PaymentsOp::GetCustomer => vec![FieldSpec::required(
                "customer_id",
                String,
                "Customer ID (cus_...)",
            )],
            PaymentsOp::CreateSubscription => vec![
                FieldSpec::required("customer_id", String, "Customer ID (cus_...)"),
                FieldSpec::required("price_id", String, "Recurring price ID (price_...)"),
            ],
            PaymentsOp::ListProducts => vec![FieldSpec::optional(
                "limit",
                Integer,
                "Maximum number of products (default 10)",
            )],
            PaymentsOp::RefundPayment => vec![
                FieldSpec::required("payment_intent_id", String, "Payment intent to refund"),
                FieldSpec::optional("amount", Integer, "Partial amount in the smallest currency unit"),
                FieldSpec::optional(
                    "reason",
                    String,
                    "duplicate, fraudulent or requested_by_customer",
                ),
            ],
        }
    }
}

/// Stripe call-through. The backend is authoritative for all amounts.
pub struct PaymentsAdapter<T: ApiTransport = HttpTransport> {
    transport: T,
}

impl PaymentsAdapter<HttpTransport> {
    pub fn from_credentials(credentials: &PaymentsCredentials, client: reqwest::Client) -> Result<Self> {
        let transport = HttpTransport::new(client, STRIPE_API_BASE)?.bearer(&credentials.secret_key)?;
        Ok(Self::new(transport))
    }
}

impl<T: ApiTransport> PaymentsAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call(&self, request: ApiRequest) -> Result<Output> {
        Ok(Output::Json(self.transport.send(request).await?))
    }
}

#[async_trait]
impl<T: ApiTransport + 'static> Adapter for PaymentsAdapter<T> {
    type Op = PaymentsOp;

    fn name(&self) -> &'static str {
        "payments"
    }

    async fn invoke(&mut self, op: PaymentsOp, args: &Arguments) -> Result<Output> {
        match op {
            PaymentsOp::CreatePaymentIntent => {
                let mut form = vec![
                    pair("amount", args.i64("amount")?),
                    pair("currency", args.str("currency")?.to_lowercase()),
                ];
                if let Some(customer) = args.opt_str("customer")? {
                    form.push(pair("customer", customer));
                }
                if let Some(description) = args.opt_str("description")? {
                    form.push(pair("description", description));
                }
                if let Some(metadata) = args.opt_object("metadata")? {
                    push_metadata(&mut form, metadata);
                }
                self.call(ApiRequest::post("v1/payment_intents").form(form)).await
            }
            PaymentsOp::GetPaymentIntent => {
                let id = segment(args.str("payment_intent_id")?);
                self.call(ApiRequest::get(format!("v1/payment_intents/{id}"))).await
            }
            PaymentsOp::CreateCustomer => {
                let mut form = vec![pair("email", args.str("email")?)];
                if let Some(name) = args.opt_str("name")? {
                    form.push(pair("name", name));
                }
                if let Some(phone) = args.opt_str("phone")? {
                    form.push(pair("phone", phone));
                }
                if let Some(metadata) = args.opt_object("metadata")? {
                    push_metadata(&mut form, metadata);
                }
                self.call(ApiRequest::post("v1/customers").form(form)).await
            }
            PaymentsOp::GetCustomer => {
                let id = segment(args.str("customer_id")?);
                self.call(ApiRequest::get(format!("v1/customers/{id}"))).await
            }
            PaymentsOp::CreateSubscription => {
                let form = vec![
                    pair("customer", args.str("customer_id")?),
                    pair("items[0][price]", args.str("price_id")?),
                ];
                self.call(ApiRequest::post("v1/subscriptions").form(form)).await
            }
            PaymentsOp::ListProducts => {
                let limit = args.opt_i64("limit")?.unwrap_or(DEFAULT_PRODUCT_LIMIT);
                self.call(ApiRequest::get("v1/products").query("limit", limit.to_string()))
                    .await
            }
            PaymentsOp::RefundPayment => {
                let mut form = vec![pair("payment_intent", args.str("payment_intent_id")?)];
                if let Some(amount) = args.opt_i64("amount")? {
                    form.push(pair("amount", amount));
                }
                if let Some(reason) = args.opt_str("reason")? {
                    form.push(pair("reason", reason));
                }
                self.call(ApiRequest::post("v1/refunds").form(form)).await
            }
        }
    }
}

fn pair(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

/// Percent-encode an identifier for use as a single path segment
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Flatten metadata into Stripe's `metadata[key]=value` form fields
fn push_metadata(form: &mut Vec<(String, String)>, metadata: &Map<String, Value>) {
    for (key, value) in metadata {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        form.push((format!("metadata[{key}]"), value));
    }
}
