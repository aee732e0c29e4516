// src/claims/mod.rs

//! Projection of the flat BYU and WSO2 claim URIs onto a structured result.

mod value;

pub use value::{ClaimMap, ClaimValue};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Claim URIs read by [`normalize`].
pub mod uri {
    pub const CLIENT_BYU_ID: &str = "http://byu.edu/claims/client_byu_id";
    pub const CLIENT_CLAIM_SOURCE: &str = "http://byu.edu/claims/client_claim_source";
    pub const CLIENT_NET_ID: &str = "http://byu.edu/claims/client_net_id";
    pub const CLIENT_PERSON_ID: &str = "http://byu.edu/claims/client_person_id";
    pub const CLIENT_PREFERRED_FIRST_NAME: &str = "http://byu.edu/claims/client_preferred_first_name";
    pub const CLIENT_NAME_PREFIX: &str = "http://byu.edu/claims/client_name_prefix";
    pub const CLIENT_REST_OF_NAME: &str = "http://byu.edu/claims/client_rest_of_name";
    pub const CLIENT_SORT_NAME: &str = "http://byu.edu/claims/client_sort_name";
    pub const CLIENT_SUBSCRIBER_NET_ID: &str = "http://byu.edu/claims/client_subscriber_net_id";
    pub const CLIENT_NAME_SUFFIX: &str = "http://byu.edu/claims/client_name_suffix";
    pub const CLIENT_SURNAME: &str = "http://byu.edu/claims/client_surname";
    pub const CLIENT_SURNAME_POSITION: &str = "http://byu.edu/claims/client_surname_position";

    pub const RESOURCE_OWNER_BYU_ID: &str = "http://byu.edu/claims/resourceowner_byu_id";
    pub const RESOURCE_OWNER_NET_ID: &str = "http://byu.edu/claims/resourceowner_net_id";
    pub const RESOURCE_OWNER_PERSON_ID: &str = "http://byu.edu/claims/resourceowner_person_id";
    pub const RESOURCE_OWNER_PREFERRED_FIRST_NAME: &str =
        "http://byu.edu/claims/resourceowner_preferred_first_name";
    pub const RESOURCE_OWNER_PREFIX: &str = "http://byu.edu/claims/resourceowner_prefix";
    pub const RESOURCE_OWNER_REST_OF_NAME: &str = "http://byu.edu/claims/resourceowner_rest_of_name";
    pub const RESOURCE_OWNER_SORT_NAME: &str = "http://byu.edu/claims/resourceowner_sort_name";
    pub const RESOURCE_OWNER_SUFFIX: &str = "http://byu.edu/claims/resourceowner_suffix";
    pub const RESOURCE_OWNER_SURNAME: &str = "http://byu.edu/claims/resourceowner_surname";
    pub const RESOURCE_OWNER_SURNAME_POSITION: &str = "http://byu.edu/claims/resourceowner_surname_position";

    pub const WSO2_API_CONTEXT: &str = "http://wso2.org/claims/apicontext";
    pub const WSO2_APPLICATION_ID: &str = "http://wso2.org/claims/applicationid";
    pub const WSO2_APPLICATION_NAME: &str = "http://wso2.org/claims/applicationname";
    pub const WSO2_APPLICATION_TIER: &str = "http://wso2.org/claims/applicationtier";
    pub const WSO2_CLIENT_ID: &str = "http://wso2.org/claims/client_id";
    pub const WSO2_END_USER: &str = "http://wso2.org/claims/enduser";
    pub const WSO2_END_USER_TENANT_ID: &str = "http://wso2.org/claims/enduserTenantId";
    pub const WSO2_KEY_TYPE: &str = "http://wso2.org/claims/keytype";
    pub const WSO2_SUBSCRIBER: &str = "http://wso2.org/claims/subscriber";
    pub const WSO2_TIER: &str = "http://wso2.org/claims/tier";
    pub const WSO2_USER_TYPE: &str = "http://wso2.org/claims/usertype";
    pub const WSO2_VERSION: &str = "http://wso2.org/claims/version";
}

/// Identity of the client application that requested the token.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientClaims {
    pub byu_id: Option<ClaimValue>,
    pub claim_source: Option<ClaimValue>,
    pub net_id: Option<ClaimValue>,
    pub person_id: Option<ClaimValue>,
    pub preferred_first_name: Option<ClaimValue>,
    pub prefix: Option<ClaimValue>,
    pub rest_of_name: Option<ClaimValue>,
    pub sort_name: Option<ClaimValue>,
    pub subscriber_net_id: Option<ClaimValue>,
    pub suffix: Option<ClaimValue>,
    pub surname: Option<ClaimValue>,
    pub surname_position: Option<ClaimValue>,
}

/// Identity of the end user on whose behalf a delegated token was issued.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOwnerClaims {
    pub byu_id: Option<ClaimValue>,
    pub net_id: Option<ClaimValue>,
    pub person_id: Option<ClaimValue>,
    pub preferred_first_name: Option<ClaimValue>,
    pub prefix: Option<ClaimValue>,
    pub rest_of_name: Option<ClaimValue>,
    pub sort_name: Option<ClaimValue>,
    pub suffix: Option<ClaimValue>,
    pub surname: Option<ClaimValue>,
    pub surname_position: Option<ClaimValue>,
}

/// The identity downstream authorization checks run against. Always taken
/// whole from either the resource owner or the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebresCheck {
    pub byu_id: Option<ClaimValue>,
    pub net_id: Option<ClaimValue>,
    pub person_id: Option<ClaimValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByuClaims {
    pub client: ClientClaims,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_owner: Option<ResourceOwnerClaims>,
    pub webres_check: WebresCheck,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Wso2Application {
    pub id: Option<ClaimValue>,
    pub name: Option<ClaimValue>,
    pub tier: Option<ClaimValue>,
}

/// Claims added by the WSO2 API manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wso2Claims {
    pub api_context: Option<ClaimValue>,
    pub application: Wso2Application,
    pub client_id: Option<ClaimValue>,
    pub end_user: Option<ClaimValue>,
    pub end_user_tenant_id: Option<ClaimValue>,
    pub key_type: Option<ClaimValue>,
    pub subscriber: Option<ClaimValue>,
    pub tier: Option<ClaimValue>,
    pub user_type: Option<ClaimValue>,
    pub version: Option<ClaimValue>,
}

/// A verified token: the original claims bag plus the structured `byu` and
/// `wso2` groups. Serializes as one object with the groups next to the raw claims;
/// raw claims named `byu` or `wso2` are shadowed by the groups.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedJwt {
    pub claims: ClaimMap,
    pub byu: ByuClaims,
    pub wso2: Wso2Claims,
}

impl Serialize for DecodedJwt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in &self.claims {
            if name != "byu" && name != "wso2" {
                map.serialize_entry(name, value)?;
            }
        }
        map.serialize_entry("byu", &self.byu)?;
        map.serialize_entry("wso2", &self.wso2)?;
        map.end()
    }
}

impl DecodedJwt {
    /// Looks up a raw claim by name or URI.
    pub fn claim(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get(name)
    }
}

/// Builds the structured result for a flat claims bag.
///
/// Missing claims become `None`. `byu.resource_owner` is present only when the
/// resource-owner BYU ID claim is, and then also feeds `byu.webres_check`.
pub fn normalize(claims: &ClaimMap) -> DecodedJwt {
    let get = |uri: &str| claims.get(uri).filter(|value| **value != ClaimValue::Null).cloned();

    let client = ClientClaims {
        byu_id: get(uri::CLIENT_BYU_ID),
        claim_source: get(uri::CLIENT_CLAIM_SOURCE),
        net_id: get(uri::CLIENT_NET_ID),
        person_id: get(uri::CLIENT_PERSON_ID),
        preferred_first_name: get(uri::CLIENT_PREFERRED_FIRST_NAME),
        prefix: get(uri::CLIENT_NAME_PREFIX),
        rest_of_name: get(uri::CLIENT_REST_OF_NAME),
        sort_name: get(uri::CLIENT_SORT_NAME),
        subscriber_net_id: get(uri::CLIENT_SUBSCRIBER_NET_ID),
        suffix: get(uri::CLIENT_NAME_SUFFIX),
        surname: get(uri::CLIENT_SURNAME),
        surname_position: get(uri::CLIENT_SURNAME_POSITION),
    };

    let resource_owner = claims
        .contains_key(uri::RESOURCE_OWNER_BYU_ID)
        .then(|| ResourceOwnerClaims {
            byu_id: get(uri::RESOURCE_OWNER_BYU_ID),
            net_id: get(uri::RESOURCE_OWNER_NET_ID),
            person_id: get(uri::RESOURCE_OWNER_PERSON_ID),
            preferred_first_name: get(uri::RESOURCE_OWNER_PREFERRED_FIRST_NAME),
            prefix: get(uri::RESOURCE_OWNER_PREFIX),
            rest_of_name: get(uri::RESOURCE_OWNER_REST_OF_NAME),
            sort_name: get(uri::RESOURCE_OWNER_SORT_NAME),
            suffix: get(uri::RESOURCE_OWNER_SUFFIX),
            surname: get(uri::RESOURCE_OWNER_SURNAME),
            surname_position: get(uri::RESOURCE_OWNER_SURNAME_POSITION),
        });

    let webres_check = match &resource_owner {
        Some(owner) => WebresCheck {
            byu_id: owner.byu_id.clone(),
            net_id: owner.net_id.clone(),
            person_id: owner.person_id.clone(),
        },
        None => WebresCheck {
            byu_id: client.byu_id.clone(),
            net_id: client.net_id.clone(),
            person_id: client.person_id.clone(),
        },
    };

    let wso2 = Wso2Claims {
        api_context: get(uri::WSO2_API_CONTEXT),
        application: Wso2Application {
            id: get(uri::WSO2_APPLICATION_ID),
            name: get(uri::WSO2_APPLICATION_NAME),
            tier: get(uri::WSO2_APPLICATION_TIER),
        },
        client_id: get(uri::WSO2_CLIENT_ID),
        end_user: get(uri::WSO2_END_USER),
        end_user_tenant_id: get(uri::WSO2_END_USER_TENANT_ID),
        key_type: get(uri::WSO2_KEY_TYPE),
        subscriber: get(uri::WSO2_SUBSCRIBER),
        tier: get(uri::WSO2_TIER),
        user_type: get(uri::WSO2_USER_TYPE),
        version: get(uri::WSO2_VERSION),
    };

    DecodedJwt {
        claims: claims.clone(),
        byu: ByuClaims {
            client,
            resource_owner,
            webres_check,
        },
        wso2,
    }
}
