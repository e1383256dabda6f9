use std::io::Write;

use anyhow::Result;
use chrono::Local;

use crate::application::LedgerService;
use crate::config::CompanyInfo;
use crate::domain::format_cents;

/// Exporter rendering ledger data as a tabular report. Read-only with
/// respect to the ledger.
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export the full report to CSV: a summary of every active customer
    /// followed by each customer's merged history. Returns the number of
    /// customers included.
    pub async fn export_report_csv<W: Write>(
        &self,
        company: &CompanyInfo,
        writer: W,
    ) -> Result<usize> {
        let customers = self.service.find_customers("").await?;

        // Sections have different widths, so the writer must be flexible.
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);

        csv_writer.write_record([format!("{} - credit report", company.name)])?;
        csv_writer.write_record([
            "Generated:".to_string(),
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ])?;
        csv_writer.write_record(&[""])?;

        csv_writer.write_record(["Customer summary"])?;
        csv_writer.write_record(["name", "phone", "credit_limit", "balance"])?;
        for customer in &customers {
            let balance = self.service.compute_balance(customer.id).await?;
            csv_writer.write_record([
                customer.name.clone(),
                customer.phone.clone().unwrap_or_default(),
                format_cents(customer.credit_limit_cents),
                format_cents(balance),
            ])?;
        }

        csv_writer.write_record(&[""])?;
        csv_writer.write_record(["History"])?;
        csv_writer.write_record(["customer", "kind", "description", "amount", "date"])?;
        for customer in &customers {
            let history = self.service.get_history(customer.id).await?;
            for entry in history {
                csv_writer.write_record([
                    customer.name.clone(),
                    entry.kind.to_string(),
                    entry.description.clone().unwrap_or_default(),
                    format_cents(entry.amount_cents),
                    entry.timestamp.to_rfc3339(),
                ])?;
            }
        }

        csv_writer.flush()?;
        Ok(customers.len())
    }
}
