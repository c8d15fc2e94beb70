use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub gender: String,
    pub age: u32,
    pub city: String,
    pub state: String,
    pub segment: String,
}

impl Customer {
    /// Demographic bucket used by the fact table. Bin edges follow the reporting
    /// convention: 25/35/45/60 are each the top of their bucket.
    pub fn age_group(&self) -> &'static str {
        match self.age {
            0..=25 => "18-25",
            26..=35 => "26-35",
            36..=45 => "36-45",
            46..=60 => "46-60",
            _ => "60+",
        }
    }
}
