use crate::infra::Services;
use clap::Args;
use rewear_pos::customers::{CustomerServiceError, NewCustomer};
use rewear_pos::digitize::{
    DigitizeError, ExtractedReceipt, ExtractionError, MatchDecision, ReceiptCommit,
    ReceiptExtractor, ReceiptImage,
};
use rewear_pos::error::AppError;
use rewear_pos::export::{format_amount, parse_amount};
use rewear_pos::matching::MatchOptions;

const DEMO_CUSTOMERS: [(&str, &str); 4] = [
    ("Maria", "Muster"),
    ("Mario", "Musterli"),
    ("Peter", "Meier"),
    ("Muster", "Hans"),
];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// First name the scripted receipt carries
    #[arg(long, default_value = "Maria")]
    pub(crate) first: String,
    /// Last name the scripted receipt carries
    #[arg(long, default_value = "Mustre")]
    pub(crate) last: String,
    /// Receipt amount in francs, e.g. 18.50
    #[arg(long, default_value = "18.50", value_parser = parse_amount_arg)]
    pub(crate) amount: i64,
}

fn parse_amount_arg(raw: &str) -> Result<i64, String> {
    match parse_amount(raw) {
        Some(cents) if cents > 0 => Ok(cents),
        Some(_) => Err("amount must be positive".to_string()),
        None => Err(format!("'{raw}' is not an amount")),
    }
}

/// Stands in for the vision service and always reads the same receipt.
struct ScriptedExtractor {
    receipt: ExtractedReceipt,
}

impl ReceiptExtractor for ScriptedExtractor {
    fn extract(&self, _image: &ReceiptImage) -> Result<ExtractedReceipt, ExtractionError> {
        Ok(self.receipt.clone())
    }
}

fn customer_error(err: CustomerServiceError) -> AppError {
    AppError::from(DigitizeError::from(err))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        first,
        last,
        amount,
    } = args;

    let extractor = ScriptedExtractor {
        receipt: ExtractedReceipt {
            first_name: Some(first),
            last_name: Some(last),
            amount: Some(amount),
            notes: Some("Demo-Beleg".to_string()),
            ..ExtractedReceipt::default()
        },
    };
    let services = Services::in_memory(Vec::new(), MatchOptions::default(), extractor);

    println!("Customer directory");
    for (first_name, last_name) in DEMO_CUSTOMERS {
        let customer = services
            .customers
            .create(NewCustomer {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                ..NewCustomer::default()
            })
            .map_err(customer_error)?;
        println!("- {} {}", customer.id, customer.full_name());
    }

    let image = ReceiptImage {
        bytes: b"demo receipt".to_vec(),
        content_type: Some("image/jpeg".to_string()),
    };
    let receipt = services.digitize.analyze(&image)?;
    let first_name = receipt.first_name.clone().unwrap_or_default();
    let last_name = receipt.last_name.clone().unwrap_or_default();
    let amount = receipt.amount.unwrap_or_default();
    println!(
        "\nReceipt read: {} {} | {}",
        first_name,
        last_name,
        format_amount(amount)
    );

    let suggestions = services.digitize.suggest_matches(&first_name, &last_name);
    if suggestions.skipped {
        println!("Name incomplete, no duplicate search ran");
    } else if suggestions.matches.is_empty() {
        println!("No similar customers found");
    } else {
        println!("Possible duplicates:");
        for suggestion in &suggestions.matches {
            println!(
                "  - {} {} | score {:.3} | {}",
                suggestion.result.first_name,
                suggestion.result.last_name,
                suggestion.result.score,
                suggestion.label_text
            );
        }
    }

    let decision = match suggestions.matches.first() {
        Some(top) if top.result.is_exact => MatchDecision::Existing {
            customer_id: rewear_pos::customers::CustomerId(top.result.customer_id.clone()),
        },
        _ => MatchDecision::CreateNew,
    };
    let outcome = services.digitize.commit(
        ReceiptCommit {
            first_name,
            last_name,
            amount,
            phone: receipt.phone,
            notes: receipt.notes,
            decision,
        },
        "demo",
    )?;

    let action = if outcome.created_customer {
        "Created"
    } else {
        "Credited existing customer"
    };
    println!(
        "\n{} {} | {} | new balance {}",
        action,
        outcome.customer.full_name(),
        outcome.transaction.description,
        format_amount(outcome.customer.current_balance)
    );
    Ok(())
}
