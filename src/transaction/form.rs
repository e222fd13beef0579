//! The shared form fields for creating and editing transactions.

use std::str::FromStr;

use maud::{Markup, html};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::{Category, CategoryId},
    html::{FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE},
    transaction::core::{PaymentMethod, Transaction, TransactionBuilder},
};

/// The form data for creating or updating a transaction.
// Must be parsed with axum_extra's Form since that parses an empty string as
// None instead of rejecting the request like axum::Form.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionFormData {
    /// The value of the transaction in dollars.
    pub amount: Decimal,
    /// The date when the transaction occurred.
    pub date: Date,
    /// Text detailing the transaction.
    pub description: String,
    /// The payment method submitted by the form select.
    pub payment_method: String,
    /// The ID of the category to file the transaction under.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl TransactionFormData {
    /// Convert the raw form data into a transaction builder.
    ///
    /// The amount is validated later, when the builder hits the database.
    ///
    /// # Errors
    /// This function will return an [Error::InvalidPaymentMethod] if the
    /// payment method select submitted an unknown value.
    pub fn parse(&self) -> Result<TransactionBuilder, Error> {
        let payment_method = PaymentMethod::from_str(&self.payment_method)?;

        Ok(Transaction::build(self.amount, self.date)
            .description(self.description.trim())
            .payment_method(payment_method)
            .category_id(self.category_id))
    }
}

/// The values the transaction form fields start out with.
pub struct TransactionFormDefaults<'a> {
    /// The amount to prefill, if editing an existing transaction.
    pub amount: Option<Decimal>,
    /// The date to prefill.
    pub date: Date,
    /// The description to prefill.
    pub description: &'a str,
    /// The payment method to preselect.
    pub payment_method: PaymentMethod,
    /// The category to preselect, or `None` for "No category".
    pub category_id: Option<CategoryId>,
}

pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    categories: &[Category],
) -> Markup {
    let amount_str = defaults.amount.map(|amount| amount.to_string());

    html! {
        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            input
                name="amount"
                id="amount"
                type="number"
                step="0.01"
                min="0.01"
                placeholder="0.01"
                value=[amount_str.as_deref()]
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                value=(defaults.description)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select name="category_id" id="category_id" class=(FORM_SELECT_STYLE)
            {
                option value="" selected[defaults.category_id.is_none()] { "No category" }

                @for category in categories {
                    option
                        value=(category.id)
                        selected[defaults.category_id == Some(category.id)]
                    {
                        (category.name) " (" (category.category_type.label()) ")"
                    }
                }
            }
        }

        div
        {
            label for="payment_method" class=(FORM_LABEL_STYLE) { "Payment Method" }

            select
                name="payment_method"
                id="payment_method"
                required
                class=(FORM_SELECT_STYLE)
            {
                @for payment_method in PaymentMethod::all() {
                    option
                        value=(payment_method.as_str())
                        selected[payment_method == defaults.payment_method]
                    {
                        (payment_method.label())
                    }
                }
            }
        }
    }
}
