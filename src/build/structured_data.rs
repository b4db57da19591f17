//! schema.org `LocalBusiness` markup for a location page.
//!
//! Every field is a projection of the record plus the fixed business info;
//! nothing here depends on the rendering template.

use serde::Serialize;

use crate::config::BusinessInfo;
use crate::dataset::LocationRecord;

use super::escape::json_for_script;

const SCHEMA_CONTEXT: &str = "https://schema.org";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalBusiness<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    #[serde(rename = "@id")]
    id: String,
    name: String,
    description: String,
    url: String,
    telephone: &'a str,
    address: PostalAddress<'a>,
    geo: GeoCoordinates,
    area_served: City<'a>,
    service_area: GeoCircle,
    opening_hours: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    address_locality: &'a str,
    address_region: &'a str,
    postal_code: &'a str,
    address_country: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GeoCoordinates {
    #[serde(rename = "@type")]
    kind: &'static str,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct City<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    name: &'a str,
    address_region: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCircle {
    #[serde(rename = "@type")]
    kind: &'static str,
    geo_midpoint: GeoCoordinates,
    geo_radius: String,
}

impl<'a> LocalBusiness<'a> {
    /// Project a record onto the markup. `canonical_url` is the page's
    /// absolute URL and doubles as the `@id`.
    pub fn new(business: &'a BusinessInfo, record: &'a LocationRecord, canonical_url: &str) -> Self {
        let geo = GeoCoordinates {
            kind: "GeoCoordinates",
            latitude: record.lat,
            longitude: record.lng,
        };

        Self {
            context: SCHEMA_CONTEXT,
            kind: "LocalBusiness",
            id: canonical_url.to_string(),
            name: format!("{} - {} Location", business.name, record.name),
            description: format!(
                "Professional fence installation and repair services in {}, {}",
                record.name, business.region
            ),
            url: canonical_url.to_string(),
            telephone: &business.telephone,
            address: PostalAddress {
                kind: "PostalAddress",
                address_locality: &record.name,
                address_region: &business.region,
                postal_code: &record.zip,
                address_country: &business.country,
            },
            geo,
            area_served: City {
                kind: "City",
                name: &record.name,
                address_region: &business.region,
            },
            service_area: GeoCircle {
                kind: "GeoCircle",
                geo_midpoint: geo,
                geo_radius: business.service_radius_m.to_string(),
            },
            opening_hours: &business.opening_hours,
        }
    }

    /// Pretty-printed JSON, safe to place inside a `<script>` element.
    pub fn to_script_json(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(json_for_script(&json))
    }
}
