//! Static local knowledge: peripheral-area and street coordinates,
//! municipality centroids, fallback centers, and region bounds.
//!
//! Coverage follows the service territory: the left-bank Palilula periphery
//! (Borča, Krnjača, Ovča, Kotež, Padinska Skela) where external geocoders
//! are least reliable, plus the rest of the Belgrade municipalities at
//! centroid granularity. Coordinates are map anchors, not survey data.

use super::types::{BoundingBox, Coordinate};

/// Street-granularity results must land inside the wider Belgrade area.
pub const BELGRADE_BOUNDS: BoundingBox = BoundingBox {
    lat_min: 44.55,
    lat_max: 45.05,
    lng_min: 20.15,
    lng_max: 20.75,
};

/// Municipality-granularity results must land inside Serbia.
pub const SERBIA_BOUNDS: BoundingBox = BoundingBox {
    lat_min: 42.2,
    lat_max: 46.2,
    lng_min: 18.8,
    lng_max: 23.1,
};

/// Anchor for inputs nothing else recognizes: central Belgrade.
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(44.8176, 20.4569);

/// A known peripheral area: name aliases, center, and known streets.
pub struct Area {
    /// Canonical name first, then ASCII-degraded aliases. All lowercase.
    pub names: &'static [&'static str],
    pub center: Coordinate,
    pub streets: &'static [(&'static str, Coordinate)],
}

pub const AREAS: &[Area] = &[
    Area {
        names: &["borča", "borca"],
        center: Coordinate::new(44.8710, 20.4500),
        streets: &[
            ("borska", Coordinate::new(44.8735, 20.4452)),
            ("ivana milutinovića", Coordinate::new(44.8690, 20.4480)),
            ("zrenjaninski put", Coordinate::new(44.8660, 20.4570)),
            ("valjevskog odreda", Coordinate::new(44.8745, 20.4515)),
            ("ratnih vojnih invalida", Coordinate::new(44.8770, 20.4430)),
        ],
    },
    Area {
        names: &["krnjača", "krnjaca"],
        center: Coordinate::new(44.8550, 20.4780),
        streets: &[
            ("pančevački put", Coordinate::new(44.8493, 20.4825)),
            ("sibnička", Coordinate::new(44.8570, 20.4760)),
            ("jabučki rit", Coordinate::new(44.8650, 20.4900)),
        ],
    },
    Area {
        names: &["ovča", "ovca"],
        center: Coordinate::new(44.8850, 20.5350),
        streets: &[
            ("mihaila eminesku", Coordinate::new(44.8860, 20.5330)),
            ("revolucije", Coordinate::new(44.8840, 20.5370)),
        ],
    },
    Area {
        names: &["kotež", "kotez"],
        center: Coordinate::new(44.8660, 20.4880),
        streets: &[
            ("trajka grkovića", Coordinate::new(44.8650, 20.4900)),
            ("vase čarapića", Coordinate::new(44.8675, 20.4860)),
        ],
    },
    Area {
        names: &["padinska skela"],
        center: Coordinate::new(44.9510, 20.4300),
        streets: &[
            ("glavna", Coordinate::new(44.9520, 20.4280)),
            ("besni fok", Coordinate::new(44.9700, 20.4350)),
        ],
    },
    Area {
        names: &["zemun"],
        center: Coordinate::new(44.8430, 20.4011),
        streets: &[
            ("glavna", Coordinate::new(44.8415, 20.4075)),
            ("prvomajska", Coordinate::new(44.8500, 20.3900)),
            ("cara dušana", Coordinate::new(44.8480, 20.4030)),
        ],
    },
    Area {
        names: &["batajnica"],
        center: Coordinate::new(44.9030, 20.2760),
        streets: &[
            ("majora zorana radosavljevića", Coordinate::new(44.8990, 20.2830)),
            ("pukovnika milenka pavlovića", Coordinate::new(44.9060, 20.2710)),
        ],
    },
    Area {
        names: &["mirijevo"],
        center: Coordinate::new(44.7900, 20.5250),
        streets: &[
            ("mirijevski venac", Coordinate::new(44.7920, 20.5200)),
            ("matice srpske", Coordinate::new(44.7880, 20.5290)),
        ],
    },
    Area {
        names: &["višnjica", "visnjica"],
        center: Coordinate::new(44.8280, 20.5250),
        streets: &[
            ("maršala tita", Coordinate::new(44.8290, 20.5230)),
            ("slanački put", Coordinate::new(44.8220, 20.5150)),
        ],
    },
];

/// A Belgrade municipality with its centroid. All lowercase; display names
/// are recovered by title-casing.
pub struct Municipality {
    pub names: &'static [&'static str],
    pub center: Coordinate,
}

pub const MUNICIPALITIES: &[Municipality] = &[
    Municipality { names: &["stari grad"], center: Coordinate::new(44.8184, 20.4586) },
    Municipality { names: &["vračar", "vracar"], center: Coordinate::new(44.7966, 20.4763) },
    Municipality { names: &["zvezdara"], center: Coordinate::new(44.7977, 20.5093) },
    Municipality { names: &["palilula"], center: Coordinate::new(44.8190, 20.4765) },
    Municipality { names: &["novi beograd"], center: Coordinate::new(44.8057, 20.4243) },
    Municipality { names: &["zemun"], center: Coordinate::new(44.8430, 20.4011) },
    Municipality { names: &["čukarica", "cukarica"], center: Coordinate::new(44.7695, 20.4187) },
    Municipality { names: &["rakovica"], center: Coordinate::new(44.7466, 20.4432) },
    Municipality { names: &["voždovac", "vozdovac"], center: Coordinate::new(44.7664, 20.4831) },
    Municipality { names: &["savski venac"], center: Coordinate::new(44.7924, 20.4519) },
    Municipality { names: &["grocka"], center: Coordinate::new(44.6713, 20.7157) },
    Municipality { names: &["lazarevac"], center: Coordinate::new(44.3839, 20.2594) },
    Municipality { names: &["mladenovac"], center: Coordinate::new(44.4365, 20.6969) },
    Municipality { names: &["obrenovac"], center: Coordinate::new(44.6563, 20.2002) },
    Municipality { names: &["sopot"], center: Coordinate::new(44.5181, 20.5750) },
    Municipality { names: &["barajevo"], center: Coordinate::new(44.5988, 20.4176) },
    Municipality { names: &["surčin", "surcin"], center: Coordinate::new(44.7937, 20.2813) },
];

/// Smaller anchor table for the deterministic fallback tier.
pub const FALLBACK_CENTERS: &[(&str, Coordinate)] = &[
    ("borča", Coordinate::new(44.8710, 20.4500)),
    ("borca", Coordinate::new(44.8710, 20.4500)),
    ("krnjača", Coordinate::new(44.8550, 20.4780)),
    ("krnjaca", Coordinate::new(44.8550, 20.4780)),
    ("kotež", Coordinate::new(44.8660, 20.4880)),
    ("kotez", Coordinate::new(44.8660, 20.4880)),
    ("ovča", Coordinate::new(44.8850, 20.5350)),
    ("ovca", Coordinate::new(44.8850, 20.5350)),
    ("padinska", Coordinate::new(44.9510, 20.4300)),
    ("zemun", Coordinate::new(44.8430, 20.4011)),
    ("palilula", Coordinate::new(44.8190, 20.4765)),
    ("novi beograd", Coordinate::new(44.8057, 20.4243)),
];

/// Postal codes for areas that have one, used as an external query variant.
pub const POSTAL_CODES: &[(&str, &str)] = &[
    ("borča", "11211"),
    ("borca", "11211"),
    ("krnjača", "11210"),
    ("krnjaca", "11210"),
    ("kotež", "11210"),
    ("kotez", "11210"),
    ("ovča", "11212"),
    ("ovca", "11212"),
    ("padinska skela", "11213"),
    ("zemun", "11080"),
    ("batajnica", "11273"),
    ("novi beograd", "11070"),
];

/// Substring-match a query against the area tables.
pub fn lookup_area(query: &str) -> Option<&'static Area> {
    let q = query.to_lowercase();
    if q.is_empty() {
        return None;
    }
    AREAS.iter().find(|area| {
        area.names
            .iter()
            .any(|name| name.contains(&q) || q.contains(name))
    })
}

impl Area {
    /// Substring-match a street segment against this area's street table.
    pub fn street(&self, query: &str) -> Option<Coordinate> {
        let q = query.to_lowercase();
        if q.is_empty() {
            return None;
        }
        self.streets
            .iter()
            .find(|(name, _)| name.contains(&q) || q.contains(name))
            .map(|(_, coord)| *coord)
    }

    pub fn canonical_name(&self) -> &'static str {
        self.names[0]
    }
}

/// Match a municipality name: exact first, then substring either direction.
/// Returns the canonical (lowercase) name and centroid.
pub fn lookup_municipality(query: &str) -> Option<(&'static str, Coordinate)> {
    let q = query.to_lowercase();
    if q.is_empty() {
        return None;
    }

    for m in MUNICIPALITIES {
        if m.names.iter().any(|name| *name == q) {
            return Some((m.names[0], m.center));
        }
    }
    for m in MUNICIPALITIES {
        if m.names.iter().any(|name| name.contains(&q) || q.contains(name)) {
            return Some((m.names[0], m.center));
        }
    }
    None
}

/// Anchor for the deterministic fallback tier. Always yields a coordinate;
/// the name is `None` when only the default center matched.
pub fn fallback_center(query: &str) -> (Option<&'static str>, Coordinate) {
    let q = query.to_lowercase();
    FALLBACK_CENTERS
        .iter()
        .find(|(name, _)| q.contains(name))
        .map(|(name, coord)| (Some(*name), *coord))
        .unwrap_or((None, DEFAULT_CENTER))
}

/// Postal code for an area, when known.
pub fn postal_code(area: &str) -> Option<&'static str> {
    let a = area.to_lowercase();
    POSTAL_CODES
        .iter()
        .find(|(name, _)| *name == a)
        .map(|(_, code)| *code)
}
