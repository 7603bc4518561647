use anyhow::Result;

use crate::validator::category::Category;
use crate::validator::constants::{
    EXPORT_FILE_EXTENSION, EXPORT_FILE_PREFIX, TEMPLATE_FILE_PREFIX,
};
use crate::validator::report::ReportRow;

/// Column layout of an exported report. Fixed per category, not
/// configurable: three identity columns, the service pair when the
/// category has one, an IT/Master pair per value column, then the remark.
pub fn export_headers(category: Category) -> Vec<String> {
    let mut headers = vec![
        "Origin".to_string(),
        "Destination".to_string(),
        category.key_label().to_string(),
    ];
    if category.label_pattern().is_some() {
        headers.push("Service IT".to_string());
        headers.push("Service Master".to_string());
    }
    for spec in category.fields() {
        headers.push(format!("{} IT", spec.display));
        headers.push(format!("{} Master", spec.display));
    }
    headers.push("Keterangan".to_string());
    headers
}

/// Serialize rows (already filtered by the caller) into a comma-delimited,
/// UTF-8 CSV. Fields holding a comma or quote are quoted with embedded
/// quotes doubled; everything else is written bare.
pub fn export_csv(rows: &[&ReportRow], category: Category) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(export_headers(category))?;

    for row in rows {
        let mut record = vec![
            row.origin.clone(),
            row.destination.clone(),
            row.code.clone(),
        ];
        if category.label_pattern().is_some() {
            record.push(row.service_it.clone());
            record.push(row.service_master.clone());
        }
        for pair in &row.values {
            record.push(pair.it.to_string());
            record.push(pair.master.to_string());
        }
        record.push(row.keterangan.clone());
        writer.write_record(record)?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("finalizing export buffer: {}", err))
}

pub fn export_file_name(category: Category, epoch_ms: u64) -> String {
    format!(
        "{}{}_{}{}",
        EXPORT_FILE_PREFIX,
        category.code(),
        epoch_ms,
        EXPORT_FILE_EXTENSION
    )
}

/// Which side of a validation a template seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRole {
    It,
    Master,
}

impl TemplateRole {
    pub fn code(&self) -> &'static str {
        match self {
            TemplateRole::It => "IT",
            TemplateRole::Master => "MASTER",
        }
    }
}

/// Onboarding templates: one fixed header plus one example row per
/// category and role. Literal content, independent of the engine.
pub fn template_csv(category: Category, role: TemplateRole) -> &'static str {
    match (category, role) {
        (Category::Tarif, TemplateRole::It) => {
            "SYS_CODE,ORIGIN,DESTINATION,SERVICE,TARIF,SLA_FORM,SLA_THRU\n\
             JKT10BDO10,JAKARTA,BANDUNG,REGULER,9500,2,3\n"
        }
        (Category::Tarif, TemplateRole::Master) => {
            "KODE SYSTEM;ORIGIN;DESTINATION;SERVICE;TARIF;SLA FORM;SLA THRU\n\
             JKT10BDO10;JAKARTA;BANDUNG;REGULER;9500;2;3\n"
        }
        (Category::Biaya, TemplateRole::It) => {
            "DEST_CODE,ORIGIN,DESTINATION,BIAYA,MIN_KG\n\
             BDO10,JAKARTA,BANDUNG,4200,10\n"
        }
        (Category::Biaya, TemplateRole::Master) => {
            "KODE DEST;ORIGIN;DESTINATION;BIAYA;MINIMUM\n\
             BDO10;JAKARTA;BANDUNG;4200;10\n"
        }
    }
}

pub fn template_file_name(category: Category, role: TemplateRole) -> String {
    format!(
        "{}{}_{}{}",
        TEMPLATE_FILE_PREFIX,
        role.code(),
        category.code(),
        EXPORT_FILE_EXTENSION
    )
}
