//! Built-in provider rules, in evaluation order.

use super::{EdgeMatch, Predicate, Rule};
use crate::error::InspectorResult;
use crate::ranges::{Provider, labels};

/// Exact names and addresses of known origins, edges and redirect services.
fn literal_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            Predicate::exact(["cdn.amazee.io.", "amazeeio.map.fastly.net."]),
            EdgeMatch::edge("amazee.io CDN"),
        )
        .with_govcms_override(),
        Rule::new(
            Predicate::exact([
                "govcmshosting.govcms.gov.au.",
                "nlb-openshift-router-f85d6d5b67bd33e7.elb.ap-southeast-2.amazonaws.com.",
            ]),
            EdgeMatch::origin("GovCMS AWS origin"),
        ),
        Rule::new(
            Predicate::exact([
                "cdn.govcms.gov.au.",
                "paascdn.govcms.gov.au.",
                "seccdn.govcms.gov.au.",
            ]),
            EdgeMatch::edge("GovCMS Akamai"),
        ),
        // amazee.io clusters
        Rule::new(
            Predicate::exact([
                "au.amazee.io.",
                "openshift-router-nlb-3cbe03ab403ff943.elb.ap-southeast-2.amazonaws.com.",
            ]),
            EdgeMatch::origin("amazee.io AU1 direct"),
        ),
        Rule::new(
            Predicate::exact(["au2.amazee.io."]),
            EdgeMatch::origin("amazee.io AU2 direct"),
        ),
        Rule::new(
            Predicate::exact(["sdp1.amazee.io."]),
            EdgeMatch::origin("amazee.io SDP1 direct"),
        ),
        Rule::new(
            Predicate::exact([
                "us.amazee.io.",
                "openshift-tcp-lb-759fb7958b9a9577.elb.us-east-1.amazonaws.com.",
            ]),
            EdgeMatch::origin("amazee.io US1 direct"),
        ),
        Rule::new(
            Predicate::exact(["ch.amazee.io.", "lagoon.ch.amazee.io."]),
            EdgeMatch::origin("amazee.io CH1 direct"),
        ),
        Rule::new(
            Predicate::exact([
                "bi.amazee.io.",
                "lb.lagoon.bi.amazee.io.",
                "openshift-tcp-nlb-routers-625ef6439c062fba.elb.eu-west-1.amazonaws.com.",
            ]),
            EdgeMatch::origin("amazee.io BI1 direct"),
        ),
        Rule::new(
            Predicate::exact([
                "de3.amazee.io.",
                "amazeeio-de3-default-ingress-e39ddc06000178cb.elb.eu-central-1.amazonaws.com.",
            ]),
            EdgeMatch::origin("amazee.io DE3 direct"),
        ),
        Rule::new(
            Predicate::exact(["dh1.amazee.io."]),
            EdgeMatch::origin("amazee.io DH1 direct"),
        ),
        // Addresses
        Rule::new(
            Predicate::exact(["103.29.195.64"]),
            EdgeMatch::origin("GovCMS HTTPS redirect service"),
        ),
        Rule::new(
            Predicate::exact(["103.29.195.62"]),
            EdgeMatch::origin("GovCMS HTTP redirect service"),
        ),
        Rule::new(
            Predicate::exact(["165.12.220.124"]),
            EdgeMatch::origin("Department of Education Skills and Employment redirect service"),
        ),
        Rule::new(
            Predicate::exact([
                "151.101.2.191",
                "151.101.66.191",
                "151.101.130.191",
                "151.101.194.191",
            ]),
            EdgeMatch::ops(),
        ),
        Rule::new(
            Predicate::exact(["13.210.235.255", "52.63.199.242", "52.65.130.121"]),
            EdgeMatch::origin("GovCMS AWS origin"),
        ),
        Rule::new(
            Predicate::exact(["13.55.153.74"]),
            EdgeMatch::origin("amazee.io AU1 direct"),
        ),
        Rule::new(
            Predicate::exact(["13.236.53.245", "54.252.24.130", "54.253.29.221"]),
            EdgeMatch::origin("amazee.io AU2 direct"),
        ),
        Rule::new(
            Predicate::exact(["20.193.15.132"]),
            EdgeMatch::origin("amazee.io SDP1 direct"),
        ),
        Rule::new(
            Predicate::exact(["34.237.122.21"]),
            EdgeMatch::origin("amazee.io US1 direct"),
        ),
        Rule::new(
            Predicate::exact(["34.206.115.145", "52.203.73.2", "54.90.185.146"]),
            EdgeMatch::origin("amazee.io US2 direct"),
        ),
        Rule::new(
            Predicate::exact(["5.102.151.21", "5.102.151.53"]),
            EdgeMatch::origin("amazee.io CH1 direct"),
        ),
        Rule::new(
            Predicate::exact(["52.50.94.28", "52.212.200.219", "18.203.240.52"]),
            EdgeMatch::origin("amazee.io BI1 direct"),
        ),
        Rule::new(
            Predicate::exact(["51.107.70.55"]),
            EdgeMatch::origin("amazee.io CH2 direct"),
        ),
        Rule::new(
            Predicate::exact(["34.65.14.103"]),
            EdgeMatch::origin("amazee.io CH3 direct"),
        ),
        Rule::new(
            Predicate::exact(["18.194.225.1", "3.125.161.174", "3.125.200.158"]),
            EdgeMatch::origin("amazee.io DE3 direct"),
        ),
    ]
}

/// Alias target patterns. Answers are fully qualified, hence the final dot.
const SUFFIXES: &[(&str, &str)] = &[
    (r"\.(akamaiedge|edgekey)\.net\.$", "GovCMS Akamai"),
    (r"\.section\.io\.$", "Section.io (via anycast)"),
    (r"\.trafficmanager\.net\.$", "Azure"),
    (r"\.fastly\.net\.$", "Fastly"),
    (r"\.cloudfront\.net\.$", "Cloudfront"),
    (r"\.cloudflare\.net\.$", "Cloudflare"),
    (r"\.incapdns\.net\.$", "Incapsula Imperva"),
    (r"\.adobecqms\.net\.$", "Adobe Experience Manager CDN"),
    (r"\.red-shield\.net\.$", "RedShield"),
    (r"\.cdn77\.org\.$", "CDN77"),
];

/// Provider ranges: CDNs first, then generic cloud compute.
fn provider_range_rules() -> Vec<Rule> {
    let amazon = |service| Predicate::cidr(Provider::Amazon, Some(service));
    let azure = |service| Predicate::cidr(Provider::Azure, Some(service));

    vec![
        Rule::new(Predicate::cidr(Provider::Cloudflare, None), EdgeMatch::edge("Cloudflare")),
        Rule::new(Predicate::cidr(Provider::Fastly, None), EdgeMatch::edge("Fastly")),
        Rule::new(amazon("CLOUDFRONT"), EdgeMatch::edge("Cloudfront")),
        Rule::new(Predicate::cidr(Provider::Akamai, None), EdgeMatch::edge("Akamai")),
        Rule::new(amazon("EC2"), EdgeMatch::origin("Amazon Web Services EC2")),
        Rule::new(amazon("S3"), EdgeMatch::origin("Amazon Web Services S3")),
        Rule::new(amazon("AMAZON"), EdgeMatch::origin("Amazon Web Services")),
        Rule::new(
            Predicate::cidr(Provider::Incapsula, None),
            EdgeMatch::edge("Incapsula Imperva"),
        ),
        Rule::new(azure("AzureFrontDoor.Frontend"), EdgeMatch::edge("Azure Front Door")),
        Rule::new(azure("AzureFrontDoor.Backend"), EdgeMatch::edge("Azure Front Door")),
    ]
}

/// Hand-curated agency and hosting ranges; the label is the outcome.
const CURATED_ORDER: &[&str] = &[
    labels::VERCEL,
    labels::VODIEN,
    labels::DECC,
    labels::GOVCMS_AKAMAI,
    labels::ATO,
    labels::INTERNODE,
    labels::NET_VIRTUE,
    labels::NETREGISTRY,
    labels::CASA,
    labels::DHS,
    labels::MACQUARIE,
    labels::OEH,
    labels::DESE,
];

/// Vendors only recognisable by what they add to the response.
const HEADERS: &[(&str, &str)] = &[
    ("section-io-id", "Section.io (via unicast)"),
    ("x-sucuri-id", "Sucuri"),
    ("x-wix-request-id", "Wix"),
];

pub(super) fn rules() -> InspectorResult<Vec<Rule>> {
    let mut rules = literal_rules();

    for (pattern, name) in SUFFIXES {
        rules.push(Rule::new(Predicate::suffix(pattern)?, EdgeMatch::edge(*name)));
    }

    rules.extend(provider_range_rules());
    rules.extend(CURATED_ORDER.iter().map(|&label| {
        Rule::new(
            Predicate::cidr(Provider::Curated, Some(label)),
            EdgeMatch::origin(label),
        )
    }));
    rules.extend(
        HEADERS
            .iter()
            .map(|&(header, name)| Rule::new(Predicate::header(header), EdgeMatch::edge(name))),
    );

    Ok(rules)
}
