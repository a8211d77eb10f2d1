//! Plain-text export of probe results.

use crate::types::{DomainStatus, ExportRecord};

/// Join the domains whose status matches `status` with newlines.
///
/// Input order is preserved and there is no trailing newline, so an empty
/// selection yields an empty string.
///
/// # Examples
///
/// ```rust
/// use doh_check_lib::{export_domains, DomainStatus, ExportRecord};
///
/// let records = vec![
///     ExportRecord::new("a.com", DomainStatus::Available),
///     ExportRecord::new("b.com", DomainStatus::Registered),
/// ];
/// assert_eq!(export_domains(&records, DomainStatus::Available), "a.com");
/// ```
pub fn export_domains(records: &[ExportRecord], status: DomainStatus) -> String {
    records
        .iter()
        .filter(|record| record.status == status)
        .map(|record| record.domain.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
