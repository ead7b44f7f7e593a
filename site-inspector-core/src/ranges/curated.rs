//! Hand-curated ranges.

use super::{IpRange, Provider, Registry, parse_ranges};

const CLOUDFLARE: &[&str] = &[
    "173.245.48.0/20",
    "103.21.244.0/22",
    "103.22.200.0/22",
    "103.31.4.0/22",
    "141.101.64.0/18",
    "108.162.192.0/18",
    "190.93.240.0/20",
    "188.114.96.0/20",
    "197.234.240.0/22",
    "198.41.128.0/17",
    "162.158.0.0/15",
    "104.16.0.0/12",
    "172.64.0.0/13",
    "131.0.72.0/22",
    "2400:cb00::/32",
    "2606:4700::/32",
    "2803:f800::/32",
    "2405:b500::/32",
    "2405:8100::/32",
    "2a06:98c0::/29",
    "2c0f:f248::/32",
];

const FASTLY: &[&str] = &[
    "23.235.32.0/20",
    "43.249.72.0/22",
    "103.244.50.0/24",
    "103.245.222.0/23",
    "103.245.224.0/24",
    "104.156.80.0/20",
    "146.75.0.0/16",
    "151.101.0.0/16",
    "157.52.64.0/18",
    "167.82.0.0/17",
    "167.82.128.0/20",
    "167.82.160.0/20",
    "167.82.224.0/20",
    "172.111.64.0/18",
    "185.31.16.0/22",
    "199.27.72.0/21",
    "199.232.0.0/16",
    "2a04:4e40::/32",
    "2a04:4e42::/32",
];

const INCAPSULA: &[&str] = &[
    "199.83.128.0/21",
    "198.143.32.0/19",
    "149.126.72.0/21",
    "103.28.248.0/22",
    "45.64.64.0/22",
    "185.11.124.0/22",
    "192.230.64.0/18",
    "107.154.0.0/16",
    "45.60.0.0/16",
    "45.223.0.0/16",
    "2a02:e980::/29",
];

const AKAMAI: &[&str] = &["104.74.32.0/20"];

/// Labels of the individually curated ranges. Each label doubles as the
/// service tag inside the [`Provider::Curated`] registry.
pub mod labels {
    pub const VERCEL: &str = "Vercel";
    pub const VODIEN: &str = "Vodien Australia";
    pub const DECC: &str = "Department of Environment and Climate Change";
    pub const GOVCMS_AKAMAI: &str = "GovCMS Akamai";
    pub const ATO: &str = "Australian Taxation Office";
    pub const INTERNODE: &str = "Internode Australia";
    pub const NET_VIRTUE: &str = "Net Virtue Australia";
    pub const NETREGISTRY: &str = "NetRegistry Australia";
    pub const CASA: &str = "Civil Aviation Safety Authority";
    pub const DHS: &str = "Department of Human Services";
    pub const MACQUARIE: &str = "Macquarie Telecom Australia";
    pub const OEH: &str = "Office of Environment and Heritage Australia";
    pub const DESE: &str = "Department of Education Skills and Employment Australia";
}

const LABELLED: &[(&str, &str)] = &[
    (labels::VERCEL, "76.76.21.0/24"),
    (labels::VODIEN, "122.201.64.0/19"),
    (labels::DECC, "141.243.20.0/24"),
    (labels::GOVCMS_AKAMAI, "23.215.224.0/20"),
    (labels::GOVCMS_AKAMAI, "104.100.0.0/20"),
    (labels::ATO, "175.106.28.0/22"),
    (labels::INTERNODE, "150.101.0.0/16"),
    (labels::NET_VIRTUE, "103.18.109.0/24"),
    (labels::NETREGISTRY, "180.235.128.0/22"),
    (labels::NETREGISTRY, "202.124.240.0/21"),
    (labels::CASA, "203.19.117.0/24"),
    (labels::DHS, "161.146.224.0/20"),
    (labels::MACQUARIE, "192.199.32.0/21"),
    (labels::OEH, "141.243.34.0/24"),
    (labels::DESE, "165.12.0.0/16"),
];

pub(super) fn registries() -> Vec<Registry> {
    let labelled = LABELLED
        .iter()
        .flat_map(|&(label, cidr)| {
            parse_ranges(label, [cidr])
                .into_iter()
                .map(move |net| IpRange::new(net, Provider::Curated, Some(label)))
        })
        .collect();

    vec![
        Registry::from_cidrs(Provider::Cloudflare, CLOUDFLARE.iter().copied()),
        Registry::from_cidrs(Provider::Fastly, FASTLY.iter().copied()),
        Registry::from_cidrs(Provider::Incapsula, INCAPSULA.iter().copied()),
        Registry::from_cidrs(Provider::Akamai, AKAMAI.iter().copied()),
        Registry::new(Provider::Curated, labelled),
    ]
}
