//! Free-text filtering over rows that have already been fetched.

use crate::models::Record;

/// Rows whose searchable fields contain `query`, ignoring case, in their
/// original order. An empty query keeps every row.
pub fn filter<'a, T: Record>(rows: &'a [T], query: &str) -> Vec<&'a T> {
    if query.is_empty() {
        return rows.iter().collect();
    }
    let needle = query.to_lowercase();
    rows.iter().filter(|row| matches(*row, &needle)).collect()
}

fn matches<T: Record>(row: &T, needle: &str) -> bool {
    row.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// A fetched result set together with the query currently applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    rows: Vec<T>,
    query: String,
}

impl<T: Record> Listing<T> {
    pub fn new(rows: Vec<T>, query: impl Into<String>) -> Self {
        Self {
            rows,
            query: query.into(),
        }
    }

    pub fn empty(query: impl Into<String>) -> Self {
        Self::new(Vec::new(), query)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replaces the query; the fetched rows are kept.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn all(&self) -> &[T] {
        &self.rows
    }

    pub fn visible(&self) -> Vec<&T> {
        filter(&self.rows, &self.query)
    }

    pub fn into_visible(self) -> Vec<T> {
        if self.query.is_empty() {
            return self.rows;
        }
        let needle = self.query.to_lowercase();
        self.rows
            .into_iter()
            .filter(|row| matches(row, &needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use uuid::Uuid;

    use crate::models::doctor::{Doctor, DoctorDetails};

    fn doctor(name: &str, specialization: &str, city: &str) -> Doctor {
        Doctor {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            details: DoctorDetails {
                full_name: name.into(),
                specialization: specialization.into(),
                qualification: None,
                phone: "555-0100".into(),
                email: format!("{}@clinic.test", name.to_lowercase().replace(' ', ".")),
                city: city.into(),
            },
        }
    }

    fn roster() -> Vec<Doctor> {
        vec![
            doctor("Meera Iyer", "Cardiology", "Chennai"),
            doctor("John Okafor", "Dermatology", "Lagos"),
            doctor("Ana Souza", "Cardiology", "Porto"),
        ]
    }

    fn names(rows: &[&Doctor]) -> Vec<String> {
        rows.iter().map(|d| d.details.full_name.clone()).collect()
    }

    #[test]
    fn matches_any_searchable_field_ignoring_case() {
        let rows = roster();
        assert_eq!(
            names(&filter(&rows, "CARDIO")),
            ["Meera Iyer", "Ana Souza"]
        );
        assert_eq!(names(&filter(&rows, "lagos")), ["John Okafor"]);
        assert_eq!(names(&filter(&rows, "okaf")), ["John Okafor"]);
    }

    #[test]
    fn email_and_phone_are_not_searched_for_doctors() {
        let rows = roster();
        assert!(filter(&rows, "clinic.test").is_empty());
        assert!(filter(&rows, "555").is_empty());
    }

    #[test]
    fn clearing_the_query_restores_the_original_order() {
        let mut listing = Listing::new(roster(), "porto");
        assert_eq!(names(&listing.visible()), ["Ana Souza"]);
        listing.set_query("");
        assert_eq!(
            names(&listing.visible()),
            ["Meera Iyer", "John Okafor", "Ana Souza"]
        );
        assert_eq!(listing.all().len(), 3);
    }

    #[test]
    fn into_visible_agrees_with_visible() {
        let listing = Listing::new(roster(), "a");
        let borrowed: Vec<Uuid> = listing.visible().iter().map(|d| d.id).collect();
        let owned: Vec<Uuid> = listing.into_visible().iter().map(|d| d.id).collect();
        assert_eq!(borrowed, owned);
    }

    proptest! {
        #[test]
        fn filtering_is_idempotent_and_order_preserving(query in "[a-zA-Z ]{0,4}") {
            let rows = roster();
            let once: Vec<Doctor> = filter(&rows, &query).into_iter().cloned().collect();
            let twice: Vec<Doctor> = filter(&once, &query).into_iter().cloned().collect();
            prop_assert_eq!(&once, &twice);

            let positions: Vec<usize> = once
                .iter()
                .map(|d| rows.iter().position(|r| r.id == d.id).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
