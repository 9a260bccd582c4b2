use std::collections::BTreeMap;

/// Static country → state → city hierarchy served by the location routes.
#[derive(Debug, Clone, Default)]
pub struct LocationCatalog {
    countries: Vec<String>,
    states: BTreeMap<String, Vec<String>>,
    cities: BTreeMap<String, Vec<String>>,
}

impl LocationCatalog {
    pub fn standard() -> Self {
        Self::default()
            .with_country("India", &["UP", "Delhi"])
            .with_country("USA", &["California", "Texas"])
            .with_state("UP", &["Noida", "Lucknow"])
            .with_state("Delhi", &["New Delhi"])
            .with_state("California", &["LA", "San Francisco"])
            .with_state("Texas", &["Houston", "Dallas"])
    }

    pub fn with_country(mut self, country: &str, states: &[&str]) -> Self {
        if !self.countries.iter().any(|known| known == country) {
            self.countries.push(country.to_string());
        }
        self.states
            .insert(country.to_string(), to_owned(states));
        self
    }

    pub fn with_state(mut self, state: &str, cities: &[&str]) -> Self {
        self.cities.insert(state.to_string(), to_owned(cities));
        self
    }

    pub fn countries(&self) -> Vec<String> {
        self.countries.clone()
    }

    /// Unknown countries yield an empty list.
    pub fn states(&self, country: &str) -> Vec<String> {
        self.states.get(country).cloned().unwrap_or_default()
    }

    /// Unknown states yield an empty list.
    pub fn cities(&self, state: &str) -> Vec<String> {
        self.cities.get(state).cloned().unwrap_or_default()
    }
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
