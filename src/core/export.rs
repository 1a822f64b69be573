//! CSV rendering of leads

use crate::infrastructure::entities::Lead;
use anyhow::Context;
use csv::{QuoteStyle, WriterBuilder};

pub const MAX_EXPORT_ROWS: i64 = 10_000;

pub const LEAD_EXPORT_HEADER: [&str; 15] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Company",
    "Project Type",
    "Message",
    "Status",
    "Source",
    "UTM Source",
    "UTM Medium",
    "UTM Campaign",
    "Device Type",
    "Assigned To",
    "Created At",
];

/// Every field is quoted and embedded quotes are doubled.
pub fn leads_to_csv(leads: &[Lead]) -> anyhow::Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(vec![]);

    writer.write_record(LEAD_EXPORT_HEADER)?;

    for lead in leads {
        writer.write_record([
            lead.id.to_string(),
            lead.name.clone(),
            lead.email.clone(),
            lead.phone.clone().unwrap_or_default(),
            lead.company.clone().unwrap_or_default(),
            lead.project_type.clone(),
            lead.message.clone(),
            lead.status.as_str().to_owned(),
            lead.source.clone().unwrap_or_default(),
            lead.utm_source.clone().unwrap_or_default(),
            lead.utm_medium.clone().unwrap_or_default(),
            lead.utm_campaign.clone().unwrap_or_default(),
            lead.device_type.clone().unwrap_or_default(),
            lead.assigned_to_name.clone().unwrap_or_default(),
            lead.created_at.to_rfc3339(),
        ])?;
    }

    let bytes = writer.into_inner().context("flushing CSV export")?;
    String::from_utf8(bytes).context("CSV export is not UTF-8")
}
