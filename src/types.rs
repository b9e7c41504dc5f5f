use serde::{Deserialize, Serialize};

/// A listing in the canonical shape shared by every source once normalized.
///
/// `price`, `surface`, `rooms` and `is_house` are always populated: rows that
/// cannot provide them never become a `Listing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub price: i64,
    /// Square meters
    pub surface: f64,
    pub rooms: u32,
    pub bedrooms: u32,
    pub is_house: bool,
    pub furnished: bool,
    /// Upper-cased city, capital rows carry their arrondissement ("PARIS 08")
    pub city: String,
    /// Two-digit department, or the full postal code for capital rows
    pub dept: u32,
    pub descr: String,
}

/// Hashable identity of a listing across every normalized column
pub type ListingKey = (i64, u64, u32, u32, bool, bool, String, u32, String);

impl Listing {
    pub fn key(&self) -> ListingKey {
        (
            self.price,
            self.surface.to_bits(),
            self.rooms,
            self.bedrooms,
            self.is_house,
            self.furnished,
            self.city.clone(),
            self.dept,
            self.descr.clone(),
        )
    }

    pub fn is_capital(&self) -> bool {
        self.city.to_uppercase().starts_with(crate::constants::CAPITAL_CITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A listing carried through address inference and geocoding.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedListing {
    pub listing: Listing,
    pub address: Option<String>,
    pub coords: Option<Coordinates>,
}

/// One row of the final table: transient columns are gone and booleans are
/// written as 0/1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanListingRow {
    pub price: i64,
    pub surface: f64,
    pub rooms: u32,
    pub bedrooms: u32,
    pub is_house: u8,
    pub furnished: u8,
    pub dept: u32,
    pub lat: f64,
    pub lon: f64,
}

impl CleanListingRow {
    /// Column names, in field order
    pub const HEADER: [&'static str; 9] = [
        "price", "surface", "rooms", "bedrooms", "is_house", "furnished", "dept", "lat", "lon",
    ];

    pub fn new(listing: &Listing, coords: Coordinates) -> Self {
        Self {
            price: listing.price,
            surface: listing.surface,
            rooms: listing.rooms,
            bedrooms: listing.bedrooms,
            is_house: u8::from(listing.is_house),
            furnished: u8::from(listing.furnished),
            dept: listing.dept,
            lat: coords.lat,
            lon: coords.lon,
        }
    }
}

/// Intermediate row written by the `normalize` command, before geocoding.
#[derive(Debug, Clone, Serialize)]
pub struct AddressedListingRow<'a> {
    pub price: i64,
    pub surface: f64,
    pub rooms: u32,
    pub bedrooms: u32,
    pub is_house: u8,
    pub furnished: u8,
    pub city: &'a str,
    pub dept: u32,
    pub address: Option<&'a str>,
    pub descr: &'a str,
}

impl<'a> AddressedListingRow<'a> {
    pub const HEADER: [&'static str; 10] = [
        "price", "surface", "rooms", "bedrooms", "is_house", "furnished", "city", "dept", "address",
        "descr",
    ];

    pub fn new(listing: &'a Listing, address: Option<&'a str>) -> Self {
        Self {
            price: listing.price,
            surface: listing.surface,
            rooms: listing.rooms,
            bedrooms: listing.bedrooms,
            is_house: u8::from(listing.is_house),
            furnished: u8::from(listing.furnished),
            city: &listing.city,
            dept: listing.dept,
            address,
            descr: &listing.descr,
        }
    }
}
