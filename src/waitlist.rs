use tracing::{debug, error, info};

use crate::aggregate;
use crate::config::{Config, FeatureConfig};
use crate::error::WaitlistError;
use crate::models::{CityGroup, RecordField, SignupOutcome};
use crate::progress::{self, Goal, Progress};
use crate::store::{InsertOutcome, RecordStore};
use crate::validate::{self, SignupForm};

/// Validates the form, rejects known emails, writes the record and reads back
/// the city's new count.
///
/// The existence check only gives a friendlier message; the store's unique
/// index still decides when two submissions race.
pub async fn submit<S: RecordStore>(
    store: &S,
    form: &SignupForm,
) -> Result<SignupOutcome, WaitlistError> {
    let signup = validate::validate(form)?;

    if store
        .exists_by_email(&signup.email)
        .await
        .map_err(WaitlistError::Transient)?
    {
        return Err(WaitlistError::Duplicate);
    }

    match store
        .insert(&signup)
        .await
        .map_err(WaitlistError::Transient)?
    {
        InsertOutcome::Inserted => {}
        InsertOutcome::DuplicateEmail => return Err(WaitlistError::Duplicate),
    }
    info!("new signup for {}", signup.city);
    debug!("inserted waitlist entry for {}", signup.email);

    let city_count = city_count(store, &signup.city).await;

    Ok(SignupOutcome {
        city: signup.city,
        city_count,
    })
}

async fn city_count<S: RecordStore>(store: &S, city: &str) -> u64 {
    store
        .count_where(RecordField::City, city)
        .await
        .unwrap_or_else(|e| {
            error!("Error getting city count: {e:#}");
            0
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub total: u64,
    pub leaderboard: Option<Vec<CityGroup>>,
}

/// Read side of the waitlist. Every view is recomputed from the store, and a
/// failed store call degrades to an empty view instead of an error.
pub struct Dashboard<'a, S> {
    store: &'a S,
    goal: Goal,
    leaderboard_size: usize,
    features: FeatureConfig,
}

impl<'a, S: RecordStore> Dashboard<'a, S> {
    pub const fn new(
        store: &'a S,
        goal: Goal,
        leaderboard_size: usize,
        features: FeatureConfig,
    ) -> Self {
        Self {
            store,
            goal,
            leaderboard_size,
            features,
        }
    }

    pub fn from_config(store: &'a S, config: &Config) -> Self {
        Self::new(
            store,
            config.waitlist.goal(),
            config.waitlist.leaderboard_size,
            config.features,
        )
    }

    pub async fn total(&self) -> u64 {
        self.store.count_all().await.unwrap_or_else(|e| {
            error!("Error getting count: {e:#}");
            0
        })
    }

    /// Cities with at least one signup, alphabetically. `None` when city
    /// progress is switched off.
    pub async fn city_options(&self) -> Option<Vec<CityGroup>> {
        if !self.features.city_progress {
            return None;
        }

        match self.store.select_locations().await {
            Ok(rows) => Some(aggregate::group_by_city_country(&rows)),
            Err(e) => {
                error!("Error loading cities: {e:#}");
                Some(Vec::new())
            }
        }
    }

    pub async fn city_progress(&self, city: &str) -> Option<Progress> {
        if !self.features.city_progress {
            return None;
        }

        let count = city_count(self.store, city).await;
        Some(progress::classify(count, self.goal))
    }

    /// Top cities by signups. `None` when the leaderboard is switched off.
    pub async fn leaderboard(&self) -> Option<Vec<CityGroup>> {
        if !self.features.leaderboard {
            return None;
        }

        match self.store.select_locations().await {
            Ok(rows) => Some(aggregate::top_cities(&rows, self.leaderboard_size)),
            Err(e) => {
                error!("Error loading leaderboard: {e:#}");
                Some(Vec::new())
            }
        }
    }

    /// The views refreshed on every timer tick.
    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            total: self.total().await,
            leaderboard: self.leaderboard().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::progress::ProgressTier;
    use crate::store::memory::MemoryStore;

    fn form(email: &str, city: &str) -> SignupForm {
        SignupForm {
            name: "Ayesha Khan".to_string(),
            email: email.to_string(),
            contact_number: String::new(),
            phone_country_code: "+92".to_string(),
            country_code: "PK".to_string(),
            country_name: "Pakistan".to_string(),
            city: city.to_string(),
            area: "Gulberg".to_string(),
        }
    }

    fn dashboard(store: &MemoryStore) -> Dashboard<'_, MemoryStore> {
        Dashboard::from_config(store, &Config::default())
    }

    #[tokio::test]
    async fn submit_reports_new_city_count() {
        let store = MemoryStore::with_locations(&[("Lahore", "Pakistan", 4)]);
        let outcome = submit(&store, &form("new@example.com", "Lahore")).await.unwrap();

        assert_eq!(
            outcome,
            SignupOutcome {
                city: "Lahore".to_string(),
                city_count: 5,
            }
        );
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn city_count_spans_countries() {
        let store = MemoryStore::with_locations(&[
            ("Paris", "France", 2),
            ("Paris", "United States", 1),
            ("Lyon", "France", 5),
        ]);
        let outcome = submit(&store, &form("new@example.com", "Paris")).await.unwrap();

        assert_eq!(outcome.city_count, 4);
        assert_eq!(RecordField::City.column(), "city");
    }

    #[tokio::test]
    async fn duplicate_email_short_circuits() {
        let store = MemoryStore::default();
        submit(&store, &form("ayesha@example.com", "Lahore")).await.unwrap();

        let err = submit(&store, &form("AYESHA@example.com", "Karachi"))
            .await
            .unwrap_err();
        assert!(matches!(err, WaitlistError::Duplicate));
        assert_eq!(err.to_string(), "This email is already on the waitlist!");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn validation_happens_before_store_calls() {
        let store = MemoryStore::default();
        store.fail_from_now();

        let err = submit(&store, &form("not-an-email", "Lahore")).await.unwrap_err();
        assert!(matches!(
            err,
            WaitlistError::Validation(ValidationError::MalformedEmail)
        ));
    }

    #[tokio::test]
    async fn store_failure_on_submit_is_transient() {
        let store = MemoryStore::default();
        store.fail_from_now();

        let err = submit(&store, &form("ayesha@example.com", "Lahore"))
            .await
            .unwrap_err();
        assert!(matches!(err, WaitlistError::Transient(_)));
        assert_eq!(err.to_string(), "Something went wrong. Please try again.");
    }

    #[tokio::test]
    async fn dashboard_views() {
        let store = MemoryStore::with_locations(&[
            ("Lahore", "Pakistan", 600),
            ("Karachi", "Pakistan", 300),
            ("Islamabad", "Pakistan", 10),
            ("Berlin", "Germany", 20),
        ]);
        let dashboard = dashboard(&store);

        assert_eq!(dashboard.total().await, 930);

        let options = dashboard.city_options().await.unwrap();
        let names: Vec<&str> = options.iter().map(|g| g.city.as_str()).collect();
        assert_eq!(names, vec!["Berlin", "Islamabad", "Karachi", "Lahore"]);

        let leaderboard = dashboard.leaderboard().await.unwrap();
        let counts: Vec<u64> = leaderboard.iter().map(|g| g.count).collect();
        assert_eq!(counts, vec![600, 300, 20]);

        let progress = dashboard.city_progress("Lahore").await.unwrap();
        assert_eq!(progress.percentage, 60);
        assert_eq!(progress.tier, ProgressTier::Halfway);
        assert_eq!(progress.remaining, 400);
    }

    #[tokio::test]
    async fn failures_degrade_to_empty_views() {
        let store = MemoryStore::with_locations(&[("Lahore", "Pakistan", 3)]);
        store.fail_from_now();
        let dashboard = dashboard(&store);

        assert_eq!(
            dashboard.snapshot().await,
            Snapshot {
                total: 0,
                leaderboard: Some(Vec::new()),
            }
        );
        assert_eq!(dashboard.city_options().await, Some(Vec::new()));
        assert_eq!(dashboard.city_progress("Lahore").await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn disabled_features_produce_no_views() {
        let store = MemoryStore::with_locations(&[("Lahore", "Pakistan", 3)]);
        let features = FeatureConfig {
            city_progress: false,
            leaderboard: false,
        };
        let dashboard = Dashboard::new(&store, Goal::default(), 3, features);

        assert_eq!(dashboard.total().await, 3);
        assert!(dashboard.leaderboard().await.is_none());
        assert!(dashboard.city_options().await.is_none());
        assert!(dashboard.city_progress("Lahore").await.is_none());
    }
}
