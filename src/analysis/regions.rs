//! Country to region lookup and regional aggregation.
//!
//! Countries are assigned to one of six world regions. Names the table
//! does not know fall into [`OTHER_REGION`].

use crate::models::{FatalityRecord, NetworkGraph, RegionYearTotal};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Region of countries missing from the lookup table.
pub const OTHER_REGION: &str = "Other";

const REGION_TABLE: &[(&str, &[&str])] = &[
    (
        "Africa",
        &[
            "Algeria",
            "Angola",
            "Benin",
            "Botswana",
            "Burkina Faso",
            "Burundi",
            "Cameroon",
            "Cape Verde",
            "Central African Republic",
            "Chad",
            "Comoros",
            "Democratic Republic of Congo",
            "Republic of Congo",
            "Djibouti",
            "Egypt",
            "Equatorial Guinea",
            "Eritrea",
            "eSwatini",
            "Ethiopia",
            "Gabon",
            "Gambia",
            "Ghana",
            "Guinea",
            "Guinea-Bissau",
            "Ivory Coast",
            "Kenya",
            "Lesotho",
            "Liberia",
            "Libya",
            "Madagascar",
            "Malawi",
            "Mali",
            "Mauritania",
            "Mauritius",
            "Mayotte",
            "Morocco",
            "Mozambique",
            "Namibia",
            "Niger",
            "Nigeria",
            "Reunion",
            "Rwanda",
            "Saint Helena, Ascension and Tristan da Cunha",
            "Sao Tome and Principe",
            "Senegal",
            "Seychelles",
            "Sierra Leone",
            "Somalia",
            "South Africa",
            "South Sudan",
            "Sudan",
            "Tanzania",
            "Togo",
            "Tunisia",
            "Uganda",
            "Zambia",
            "Zimbabwe",
        ],
    ),
    (
        "Americas",
        &[
            "Anguilla",
            "Antigua and Barbuda",
            "Argentina",
            "Aruba",
            "Bahamas",
            "Barbados",
            "Belize",
            "Bermuda",
            "Bolivia",
            "Brazil",
            "British Virgin Islands",
            "Canada",
            "Caribbean Netherlands",
            "Cayman Islands",
            "Chile",
            "Colombia",
            "Costa Rica",
            "Cuba",
            "Curacao",
            "Dominica",
            "Dominican Republic",
            "Ecuador",
            "El Salvador",
            "Falkland Islands",
            "French Guiana",
            "Greenland",
            "Grenada",
            "Guadeloupe",
            "Guatemala",
            "Guyana",
            "Haiti",
            "Honduras",
            "Jamaica",
            "Martinique",
            "Mexico",
            "Montserrat",
            "Nicaragua",
            "Panama",
            "Paraguay",
            "Peru",
            "Puerto Rico",
            "Saint Kitts and Nevis",
            "Saint Lucia",
            "Saint Pierre and Miquelon",
            "Saint Vincent and the Grenadines",
            "Saint-Barthelemy",
            "Saint-Martin",
            "Sint Maarten",
            "Suriname",
            "Trinidad and Tobago",
            "Turks and Caicos Islands",
            "United States",
            "United States Minor Outlying Islands",
            "Uruguay",
            "Venezuela",
            "Virgin Islands, U.S.",
        ],
    ),
    (
        "Asia",
        &[
            "Afghanistan",
            "Bangladesh",
            "Bhutan",
            "British Indian Ocean Territory",
            "Brunei",
            "Cambodia",
            "China",
            "East Timor",
            "Hong Kong",
            "India",
            "Indonesia",
            "Japan",
            "Kazakhstan",
            "Kyrgyzstan",
            "Laos",
            "Macau",
            "Malaysia",
            "Maldives",
            "Mongolia",
            "Myanmar",
            "Nepal",
            "North Korea",
            "Pakistan",
            "Philippines",
            "Singapore",
            "South Korea",
            "Sri Lanka",
            "Taiwan",
            "Tajikistan",
            "Thailand",
            "Turkmenistan",
            "Uzbekistan",
            "Vietnam",
        ],
    ),
    (
        "Europe",
        &[
            "Akrotiri and Dhekelia",
            "Albania",
            "Andorra",
            "Austria",
            "Belarus",
            "Belgium",
            "Bosnia and Herzegovina",
            "Bulgaria",
            "Croatia",
            "Cyprus",
            "Czech Republic",
            "Denmark",
            "Estonia",
            "Faroe Islands",
            "Finland",
            "France",
            "Germany",
            "Gibraltar",
            "Greece",
            "Bailiwick of Guernsey",
            "Hungary",
            "Iceland",
            "Ireland",
            "Isle of Man",
            "Italy",
            "Bailiwick of Jersey",
            "Kosovo",
            "Latvia",
            "Liechtenstein",
            "Lithuania",
            "Luxembourg",
            "Malta",
            "Moldova",
            "Monaco",
            "Montenegro",
            "Netherlands",
            "North Macedonia",
            "Norway",
            "Poland",
            "Portugal",
            "Romania",
            "Russia",
            "San Marino",
            "Serbia",
            "Slovakia",
            "Slovenia",
            "Spain",
            "Sweden",
            "Switzerland",
            "Ukraine",
            "United Kingdom",
            "Vatican City",
        ],
    ),
    (
        "Middle East",
        &[
            "Armenia",
            "Azerbaijan",
            "Bahrain",
            "Georgia",
            "Iran",
            "Iraq",
            "Israel",
            "Jordan",
            "Kuwait",
            "Lebanon",
            "Oman",
            "Palestine",
            "Qatar",
            "Saudi Arabia",
            "Syria",
            "Turkey",
            "United Arab Emirates",
            "Yemen",
        ],
    ),
    (
        "Oceania",
        &[
            "American Samoa",
            "Australia",
            "Christmas Island",
            "Cocos (Keeling) Islands",
            "Cook Islands",
            "Fiji",
            "French Polynesia",
            "Guam",
            "Heard Island and McDonald Islands",
            "Kiribati",
            "Marshall Islands",
            "Micronesia",
            "Nauru",
            "New Caledonia",
            "New Zealand",
            "Niue",
            "Norfolk Island",
            "Northern Mariana Islands",
            "Palau",
            "Papua New Guinea",
            "Pitcairn",
            "Samoa",
            "Solomon Islands",
            "Tokelau",
            "Tonga",
            "Tuvalu",
            "Vanuatu",
            "Wallis and Futuna",
        ],
    ),
];

/// Region a country belongs to, or [`OTHER_REGION`].
pub fn region_of(country: &str) -> &'static str {
    REGION_TABLE
        .iter()
        .find(|(_, countries)| countries.iter().any(|c| *c == country))
        .map(|(region, _)| *region)
        .unwrap_or(OTHER_REGION)
}

/// Sum fatalities per region and year.
///
/// Every year present in `records` gets one entry per region in `regions`,
/// in the given order, zero-filled. Countries outside those regions are
/// left out.
pub fn fatalities_by_region(records: &[FatalityRecord], regions: &[String]) -> Vec<RegionYearTotal> {
    let years: BTreeSet<i32> = records.iter().map(|r| r.year).collect();
    let mut sums: HashMap<(i32, &str), f64> = HashMap::new();
    let mut outside = 0usize;

    for record in records {
        let region = region_of(&record.country);
        if !regions.iter().any(|r| r == region) {
            outside += 1;
            continue;
        }
        *sums.entry((record.year, region)).or_insert(0.0) += record.fatalities;
    }

    if outside > 0 {
        debug!("{} country-year totals outside the selected regions", outside);
    }

    years
        .into_iter()
        .flat_map(|year| {
            let sums = &sums;
            regions.iter().map(move |region| RegionYearTotal {
                year,
                region: region.clone(),
                fatalities: sums.get(&(year, region.as_str())).copied().unwrap_or(0.0),
            })
        })
        .collect()
}

/// How the links of a network split across regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkMix {
    /// Both endpoints in the same known region.
    pub within: usize,
    /// Endpoints in different regions, or at least one unknown.
    pub across: usize,
}

/// Count within-region and cross-region links.
pub fn link_mix(graph: &NetworkGraph) -> LinkMix {
    graph
        .links
        .iter()
        .fold(LinkMix::default(), |mut mix, link| {
            let source = region_of(&link.source);
            if source != OTHER_REGION && source == region_of(&link.target) {
                mix.within += 1;
            } else {
                mix.across += 1;
            }
            mix
        })
}
