//! Listing filters and the query string that doubles as the listing cache key.

use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

/// Character status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Alive,
  Dead,
  Unknown,
}

impl Status {
  pub fn as_str(self) -> &'static str {
    match self {
      Status::Alive => "alive",
      Status::Dead => "dead",
      Status::Unknown => "unknown",
    }
  }
}

impl FromStr for Status {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "alive" => Ok(Status::Alive),
      "dead" => Ok(Status::Dead),
      "unknown" => Ok(Status::Unknown),
      other => Err(format!("unknown status '{}' (alive, dead, unknown)", other)),
    }
  }
}

/// Character gender filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
  Female,
  Male,
  Genderless,
  Unknown,
}

impl Gender {
  pub fn as_str(self) -> &'static str {
    match self {
      Gender::Female => "female",
      Gender::Male => "male",
      Gender::Genderless => "genderless",
      Gender::Unknown => "unknown",
    }
  }
}

impl FromStr for Gender {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "female" => Ok(Gender::Female),
      "male" => Ok(Gender::Male),
      "genderless" => Ok(Gender::Genderless),
      "unknown" => Ok(Gender::Unknown),
      other => Err(format!(
        "unknown gender '{}' (female, male, genderless, unknown)",
        other
      )),
    }
  }
}

/// Current listing filters. Empty name and `None` mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilters {
  pub name: String,
  pub status: Option<Status>,
  pub gender: Option<Gender>,
}

impl QueryFilters {
  pub fn is_empty(&self) -> bool {
    self.name.is_empty() && self.status.is_none() && self.gender.is_none()
  }
}

impl fmt::Display for QueryFilters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut parts = Vec::new();
    if !self.name.is_empty() {
      parts.push(format!("name={}", self.name));
    }
    if let Some(status) = self.status {
      parts.push(format!("status={}", status.as_str()));
    }
    if let Some(gender) = self.gender {
      parts.push(format!("gender={}", gender.as_str()));
    }
    if parts.is_empty() {
      f.write_str("no filters")
    } else {
      f.write_str(&parts.join(", "))
    }
  }
}

/// Build `?page=N[&name=..][&status=..][&gender=..]`.
///
/// Parameter order is fixed and empty filters are omitted, so two requests
/// produce the same string iff every parameter matches.
pub fn query_string(page: u32, filters: &QueryFilters) -> String {
  let mut serializer = form_urlencoded::Serializer::new(String::new());
  serializer.append_pair("page", &page.to_string());
  if !filters.name.is_empty() {
    serializer.append_pair("name", &filters.name);
  }
  if let Some(status) = filters.status {
    serializer.append_pair("status", status.as_str());
  }
  if let Some(gender) = filters.gender {
    serializer.append_pair("gender", gender.as_str());
  }
  format!("?{}", serializer.finish())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_page_only() {
    assert_eq!(query_string(1, &QueryFilters::default()), "?page=1");
  }

  #[test]
  fn test_all_filters_in_fixed_order() {
    let filters = QueryFilters {
      name: "rick".to_string(),
      status: Some(Status::Alive),
      gender: Some(Gender::Male),
    };
    assert_eq!(
      query_string(3, &filters),
      "?page=3&name=rick&status=alive&gender=male"
    );
  }

  #[test]
  fn test_name_is_encoded() {
    let filters = QueryFilters {
      name: "Mr. Poopy&Butthole".to_string(),
      ..Default::default()
    };
    assert_eq!(query_string(1, &filters), "?page=1&name=Mr.+Poopy%26Butthole");
  }

  #[test]
  fn test_distinct_filters_give_distinct_keys() {
    let dead = QueryFilters {
      status: Some(Status::Dead),
      ..Default::default()
    };
    let unknown_gender = QueryFilters {
      gender: Some(Gender::Unknown),
      ..Default::default()
    };
    assert_ne!(query_string(1, &dead), query_string(1, &unknown_gender));
    assert_ne!(query_string(1, &dead), query_string(2, &dead));
  }

  #[test]
  fn test_parse_filters() {
    assert_eq!("Alive".parse::<Status>(), Ok(Status::Alive));
    assert_eq!(" genderless ".parse::<Gender>(), Ok(Gender::Genderless));
    assert!("zombie".parse::<Status>().is_err());
  }

  #[test]
  fn test_display() {
    assert_eq!(QueryFilters::default().to_string(), "no filters");
    let filters = QueryFilters {
      name: "morty".to_string(),
      status: None,
      gender: Some(Gender::Male),
    };
    assert_eq!(filters.to_string(), "name=morty, gender=male");
  }
}
