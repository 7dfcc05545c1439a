/// Database row types for the samples table. Used by sqlx for typed reads.
/// The data columns carry no NOT NULL constraint, hence the Options.

#[derive(Debug, sqlx::FromRow)]
pub struct SampleRow {
    pub id: i64,
    pub event_title: Option<String>,
    pub question: Option<String>,
    pub price: Option<f64>,
    pub timestamp: Option<String>,
}
