use anyhow::Context;
use sqlx::{PgPool, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{LocationRow, NewSignup, RecordField, SignupRecord};
use crate::store::{InsertOutcome, RecordStore};
use crate::validate::{self, SignupForm};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed waitlist table.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RecordStore for PgStore {
    async fn insert(&self, signup: &NewSignup) -> anyhow::Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO waitlist
            (id, name, email, whatsapp_number, country, country_name, city, area, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&signup.name)
        .bind(&signup.email)
        .bind(&signup.contact_number)
        .bind(&signup.country_code)
        .bind(&signup.country_name)
        .bind(&signup.city)
        .bind(&signup.area)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
                debug!("insert rejected by unique email index");
                Ok(InsertOutcome::DuplicateEmail)
            }
            Err(error) => Err(error).context("failed to insert waitlist entry"),
        }
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT 1 FROM waitlist WHERE lower(email) = lower($1) LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("failed to check email")?;
        Ok(row.is_some())
    }

    async fn count_all(&self) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM waitlist")
            .fetch_one(&self.pool)
            .await
            .context("failed to count waitlist")?
            .get("count");
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn count_where(&self, field: RecordField, value: &str) -> anyhow::Result<u64> {
        let query = format!(
            "SELECT COUNT(*) AS count FROM waitlist WHERE {} = $1",
            field.column()
        );
        let count: i64 = sqlx::query(&query)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to count waitlist by {}", field.column()))?
            .get("count");
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn select_locations(&self) -> anyhow::Result<Vec<LocationRow>> {
        let rows = sqlx::query("SELECT city, country_name FROM waitlist")
            .fetch_all(&self.pool)
            .await
            .context("failed to load signup locations")?;

        Ok(rows
            .into_iter()
            .map(|row| LocationRow {
                city: row.get("city"),
                country_name: row.get("country_name"),
            })
            .collect())
    }

    async fn select_all(&self) -> anyhow::Result<Vec<SignupRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, email, whatsapp_number, country, country_name, city, area, created_at \
             FROM waitlist ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to load waitlist")?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(SignupRecord {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
                contact_number: row.get("whatsapp_number"),
                country_code: row.get("country"),
                country_name: row.get("country_name"),
                city: row.get("city"),
                area: row.get("area"),
                created_at: row.get("created_at"),
            });
        }

        Ok(records)
    }
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let signups = vec![
        ("Ayesha Khan", "ayesha.khan@example.com", Some("+923001234567"), "Lahore", "Gulberg"),
        ("Bilal Ahmed", "bilal.ahmed@example.com", None, "Lahore", "DHA Phase 5"),
        ("Sana Malik", "sana.malik@example.com", Some("+923451112233"), "Lahore", "Johar Town"),
        ("Hamza Siddiqui", "hamza.siddiqui@example.com", None, "Karachi", "Clifton"),
        ("Mariam Qureshi", "mariam.qureshi@example.com", None, "Karachi", "Gulshan-e-Iqbal"),
        ("Usman Tariq", "usman.tariq@example.com", Some("+923331239876"), "Islamabad", "F-7"),
    ];

    for (name, email, contact_number, city, area) in signups {
        sqlx::query(
            r#"
            INSERT INTO waitlist
            (id, name, email, whatsapp_number, country, country_name, city, area, created_at)
            VALUES ($1, $2, $3, $4, 'PK', 'Pakistan', $5, $6, now())
            ON CONFLICT ((lower(email))) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(contact_number)
        .bind(city)
        .bind(area)
        .execute(pool)
        .await?;
    }

    Ok(())
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    name: String,
    email: String,
    #[serde(default)]
    whatsapp_number: Option<String>,
    #[serde(default)]
    phone_country_code: Option<String>,
    country_code: String,
    country_name: String,
    city: String,
    area: String,
}

impl From<CsvRow> for SignupForm {
    fn from(row: CsvRow) -> Self {
        Self {
            name: row.name,
            email: row.email,
            contact_number: row.whatsapp_number.unwrap_or_default(),
            phone_country_code: row.phone_country_code.unwrap_or_default(),
            country_code: row.country_code,
            country_name: row.country_name,
            city: row.city,
            area: row.area,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub invalid: usize,
}

/// Loads signups from CSV, running every row through the same validation as
/// interactive submissions.
pub async fn import_csv<S: RecordStore>(
    store: &S,
    csv_path: &std::path::Path,
) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    import_rows(store, &mut reader).await
}

async fn import_rows<S: RecordStore, R: std::io::Read>(
    store: &S,
    reader: &mut csv::Reader<R>,
) -> anyhow::Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let form = SignupForm::from(result?);
        let signup = match validate::validate(&form) {
            Ok(signup) => signup,
            Err(ValidationError::MissingField(field)) => {
                warn!("skipping row {}: missing {field}", line + 1);
                summary.invalid += 1;
                continue;
            }
            Err(error) => {
                warn!("skipping row {}: {error}", line + 1);
                summary.invalid += 1;
                continue;
            }
        };

        match store.insert(&signup).await? {
            InsertOutcome::Inserted => summary.inserted += 1,
            InsertOutcome::DuplicateEmail => summary.duplicates += 1,
        }
    }

    Ok(summary)
}

pub async fn export_csv<S: RecordStore>(
    store: &S,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    let records = store.select_all().await?;
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;

    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(records.len())
}
