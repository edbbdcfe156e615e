//! Canonical country-name registry and country resolution

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::entities::EntitySpan;
use crate::error::ReferenceError;

/// Country names as listed by GeoNames
pub const GEONAMES_COUNTRIES: &[&str] = &[
    "Afghanistan", "Aland Islands", "Albania", "Algeria", "American Samoa", "Andorra",
    "Angola", "Anguilla", "Antarctica", "Antigua and Barbuda", "Argentina", "Armenia",
    "Aruba", "Australia", "Austria", "Azerbaijan", "Bahamas", "Bahrain", "Bangladesh",
    "Barbados", "Belarus", "Belgium", "Belize", "Benin", "Bermuda", "Bhutan", "Bolivia",
    "Bonaire, Saint Eustatius and Saba", "Bosnia and Herzegovina", "Botswana",
    "Bouvet Island", "Brazil", "British Indian Ocean Territory", "British Virgin Islands",
    "Brunei", "Bulgaria", "Burkina Faso", "Burundi", "Cabo Verde", "Cambodia", "Cameroon",
    "Canada", "Cayman Islands", "Central African Republic", "Chad", "Chile", "China",
    "Christmas Island", "Cocos Islands", "Colombia", "Comoros", "Cook Islands",
    "Costa Rica", "Croatia", "Cuba", "Curacao", "Cyprus", "Czechia",
    "Democratic Republic of the Congo", "Denmark", "Djibouti", "Dominica",
    "Dominican Republic", "Ecuador", "Egypt", "El Salvador", "Equatorial Guinea",
    "Eritrea", "Estonia", "Eswatini", "Ethiopia", "Falkland Islands", "Faroe Islands",
    "Fiji", "Finland", "France", "French Guiana", "French Polynesia",
    "French Southern Territories", "Gabon", "Gambia", "Georgia", "Germany", "Ghana",
    "Gibraltar", "Greece", "Greenland", "Grenada", "Guadeloupe", "Guam", "Guatemala",
    "Guernsey", "Guinea", "Guinea-Bissau", "Guyana", "Haiti",
    "Heard Island and McDonald Islands", "Honduras", "Hong Kong", "Hungary", "Iceland",
    "India", "Indonesia", "Iran", "Iraq", "Ireland", "Isle of Man", "Israel", "Italy",
    "Ivory Coast", "Jamaica", "Japan", "Jersey", "Jordan", "Kazakhstan", "Kenya",
    "Kiribati", "Kosovo", "Kuwait", "Kyrgyzstan", "Laos", "Latvia", "Lebanon", "Lesotho",
    "Liberia", "Libya", "Liechtenstein", "Lithuania", "Luxembourg", "Macao", "Madagascar",
    "Malawi", "Malaysia", "Maldives", "Mali", "Malta", "Marshall Islands", "Martinique",
    "Mauritania", "Mauritius", "Mayotte", "Mexico", "Micronesia", "Moldova", "Monaco",
    "Mongolia", "Montenegro", "Montserrat", "Morocco", "Mozambique", "Myanmar", "Namibia",
    "Nauru", "Nepal", "Netherlands", "New Caledonia", "New Zealand", "Nicaragua", "Niger",
    "Nigeria", "Niue", "Norfolk Island", "North Korea", "North Macedonia",
    "Northern Mariana Islands", "Norway", "Oman", "Pakistan", "Palau",
    "Palestinian Territory", "Panama", "Papua New Guinea", "Paraguay", "Peru",
    "Philippines", "Pitcairn", "Poland", "Portugal", "Puerto Rico", "Qatar",
    "Republic of the Congo", "Reunion", "Romania", "Russia", "Rwanda", "Saint Barthelemy",
    "Saint Helena", "Saint Kitts and Nevis", "Saint Lucia", "Saint Martin",
    "Saint Pierre and Miquelon", "Saint Vincent and the Grenadines", "Samoa", "San Marino",
    "Sao Tome and Principe", "Saudi Arabia", "Senegal", "Serbia", "Seychelles",
    "Sierra Leone", "Singapore", "Sint Maarten", "Slovakia", "Slovenia", "Solomon Islands",
    "Somalia", "South Africa", "South Georgia and the South Sandwich Islands",
    "South Korea", "South Sudan", "Spain", "Sri Lanka", "Sudan", "Suriname",
    "Svalbard and Jan Mayen", "Sweden", "Switzerland", "Syria", "Taiwan", "Tajikistan",
    "Tanzania", "Thailand", "Timor Leste", "Togo", "Tokelau", "Tonga",
    "Trinidad and Tobago", "Tunisia", "Turkey", "Turkmenistan", "Turks and Caicos Islands",
    "Tuvalu", "U.S. Virgin Islands", "Uganda", "Ukraine", "United Arab Emirates",
    "United Kingdom", "United States", "United States Minor Outlying Islands", "Uruguay",
    "Uzbekistan", "Vanuatu", "Vatican", "Venezuela", "Vietnam", "Wallis and Futuna",
    "Western Sahara", "Yemen", "Zambia", "Zimbabwe",
];

/// Set of canonical country names
///
/// Matching against the registry is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryRegistry {
    names: BTreeSet<String>,
}

impl CountryRegistry {
    /// Registry of the built-in GeoNames country names
    pub fn builtin() -> Self {
        Self::from_names(GEONAMES_COUNTRIES.iter().copied())
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a registry from a newline-delimited file
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReferenceError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let registry = Self::from_names(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        );
        tracing::info!("Loaded {} country names from {:?}", registry.len(), path);
        Ok(registry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Country of an affiliation: the first GPE span naming a registry country
pub fn resolve_country(spans: &[EntitySpan], registry: &CountryRegistry) -> Option<String> {
    spans
        .iter()
        .find(|span| span.is_gpe() && registry.contains(&span.text))
        .map(|span| span.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityLabel;

    #[test]
    fn test_builtin_registry() {
        let registry = CountryRegistry::builtin();
        assert!(registry.contains("France"));
        assert!(registry.contains("United States"));
        assert!(!registry.contains("france"));
        assert!(!registry.contains("Paris"));
    }

    #[test]
    fn test_first_matching_gpe() {
        let registry = CountryRegistry::builtin();
        let spans = vec![
            EntitySpan::new("Paris", EntityLabel::Gpe),
            EntitySpan::new("France", EntityLabel::Gpe),
            EntitySpan::new("Germany", EntityLabel::Gpe),
        ];
        assert_eq!(resolve_country(&spans, &registry), Some("France".to_string()));
    }

    #[test]
    fn test_org_label_ignored() {
        let registry = CountryRegistry::builtin();
        let spans = vec![EntitySpan::new("Japan", EntityLabel::Org)];
        assert_eq!(resolve_country(&spans, &registry), None);
    }

    #[test]
    fn test_case_sensitive() {
        let registry = CountryRegistry::builtin();
        let spans = vec![EntitySpan::new("FRANCE", EntityLabel::Gpe)];
        assert_eq!(resolve_country(&spans, &registry), None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countries.txt");
        fs::write(&path, "# custom\nFrance\n\nUSA\n").unwrap();

        let registry = CountryRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("USA"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = CountryRegistry::load("/nonexistent/countries.txt");
        assert!(matches!(result, Err(ReferenceError::FileNotFound(_))));
    }
}
