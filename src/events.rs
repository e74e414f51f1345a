//! Built-in event catalogue
//!
//! Airnode RRP request/fulfillment events and the dAPI server events, as
//! `sol!`-generated types with their filter builders and field projections.
//! The projections define the flat output schema for each event; the
//! scanner prepends `block` and `transaction` to every record.

use crate::error::{ConfigError, QueryError, Result};
use crate::registry::{EventDefinition, EventRegistry, QueryArgs};
use crate::scanner::Record;
use alloy::primitives::{Address, LogData, B256};
use alloy::rpc::types::{Filter, Log};
use alloy::sol;
use alloy::sol_types::SolEvent;
use serde_json::Value;

sol! {
    event SetSponsorshipStatus(address indexed sponsor, address indexed requester, bool sponsorshipStatus);
    event MadeTemplateRequest(address indexed airnode, bytes32 indexed requestId, uint256 requesterRequestCount, uint256 chainId, address requester, bytes32 templateId, address sponsor, address sponsorWallet, address fulfillAddress, bytes4 fulfillFunctionId, bytes parameters);
    event MadeFullRequest(address indexed airnode, bytes32 indexed requestId, uint256 requesterRequestCount, uint256 chainId, address requester, bytes32 endpointId, address sponsor, address sponsorWallet, address fulfillAddress, bytes4 fulfillFunctionId, bytes parameters);
    event FulfilledRequest(address indexed airnode, bytes32 indexed requestId, bytes data);
    event FailedRequest(address indexed airnode, bytes32 indexed requestId, string errorMessage);
    event SetDapiName(bytes32 indexed dapiName, bytes32 dataFeedId, address indexed sender);
    event UpdatedBeaconWithSignedData(bytes32 indexed beaconId, int256 value, uint256 timestamp);
}

/// Registry holding every built-in event, keyed by subcommand id with the
/// Solidity event name as alias.
pub fn builtin() -> Result<EventRegistry> {
    let mut registry = EventRegistry::new();
    for def in [
        EventDefinition {
            id: "full",
            aliases: &["MadeFullRequest"],
            event_type: "MadeFullRequest",
            contract: "rrp",
            abi: "event MadeFullRequest(address indexed airnode, bytes32 indexed requestId, uint256 requesterRequestCount, uint256 chainId, address requester, bytes32 endpointId, address sponsor, address sponsorWallet, address fulfillAddress, bytes4 fulfillFunctionId, bytes parameters)",
            build_filter: full_filter,
            project: full_project,
        },
        EventDefinition {
            id: "template",
            aliases: &["MadeTemplateRequest"],
            event_type: "MadeTemplateRequest",
            contract: "rrp",
            abi: "event MadeTemplateRequest(address indexed airnode, bytes32 indexed requestId, uint256 requesterRequestCount, uint256 chainId, address requester, bytes32 templateId, address sponsor, address sponsorWallet, address fulfillAddress, bytes4 fulfillFunctionId, bytes parameters)",
            build_filter: template_filter,
            project: template_project,
        },
        EventDefinition {
            id: "fulfilled",
            aliases: &["FulfilledRequest"],
            event_type: "FulfilledRequest",
            contract: "rrp",
            abi: "event FulfilledRequest(address indexed airnode, bytes32 indexed requestId, bytes data)",
            build_filter: fulfilled_filter,
            project: fulfilled_project,
        },
        EventDefinition {
            id: "failed",
            aliases: &["FailedRequest"],
            event_type: "FailedRequest",
            contract: "rrp",
            abi: "event FailedRequest(address indexed airnode, bytes32 indexed requestId, string errorMessage)",
            build_filter: failed_filter,
            project: failed_project,
        },
        EventDefinition {
            id: "sponsor",
            aliases: &["SetSponsorshipStatus"],
            event_type: "SetSponsorshipStatus",
            contract: "rrp",
            abi: "event SetSponsorshipStatus(address indexed sponsor, address indexed requester, bool sponsorshipStatus)",
            build_filter: sponsor_filter,
            project: sponsor_project,
        },
        EventDefinition {
            id: "name",
            aliases: &["SetDapiName"],
            event_type: "SetDapiName",
            contract: "dapi",
            abi: "event SetDapiName(bytes32 indexed dapiName, bytes32 dataFeedId, address indexed sender)",
            build_filter: name_filter,
            project: name_project,
        },
        EventDefinition {
            id: "ubsd",
            aliases: &["UpdatedBeaconWithSignedData"],
            event_type: "UpdatedBeaconWithSignedData",
            contract: "dapi",
            abi: "event UpdatedBeaconWithSignedData(bytes32 indexed beaconId, int256 value, uint256 timestamp)",
            build_filter: ubsd_filter,
            project: ubsd_project,
        },
    ] {
        registry.register(def)?;
    }
    Ok(registry)
}

fn parse_address(s: &str) -> Result<Address> {
    s.parse()
        .map_err(|_| ConfigError::InvalidAddress(s.to_string()).into())
}

fn parse_word(s: &str) -> Result<B256> {
    s.parse()
        .map_err(|_| ConfigError::InvalidTopicValue(s.to_string()).into())
}

fn decode<E: SolEvent>(log: &Log) -> Result<E> {
    let data = LogData::new_unchecked(log.topics().to_vec(), log.data().data.clone());
    E::decode_log_data(&data, true).map_err(|e| {
        QueryError::new(format!("failed to decode {} log: {e}", E::SIGNATURE)).into()
    })
}

fn record(pairs: Vec<(&'static str, Value)>) -> Record {
    let mut record = Record::new();
    for (key, value) in pairs {
        record.insert(key.to_string(), value);
    }
    record
}

fn text(value: impl ToString) -> Value {
    Value::String(value.to_string())
}

// ---- RRP request events (airnode/request indexed) ----

fn airnode_request_filter<E: SolEvent>(args: &QueryArgs) -> Result<Filter> {
    let mut filter = Filter::new().event_signature(E::SIGNATURE_HASH);
    if let Some(airnode) = &args.airnode {
        filter = filter.topic1(parse_address(airnode)?.into_word());
    }
    if let Some(request) = &args.request {
        filter = filter.topic2(parse_word(request)?);
    }
    Ok(filter)
}

fn full_filter(args: &QueryArgs) -> Result<Filter> {
    airnode_request_filter::<MadeFullRequest>(args)
}

fn full_project(log: &Log) -> Result<Record> {
    let ev = decode::<MadeFullRequest>(log)?;
    Ok(record(vec![
        ("airnode", text(ev.airnode)),
        ("request", text(ev.requestId)),
        ("requester", text(ev.requester)),
        ("endpoint", text(ev.endpointId)),
        ("sponsor", text(ev.sponsor)),
    ]))
}

fn template_filter(args: &QueryArgs) -> Result<Filter> {
    airnode_request_filter::<MadeTemplateRequest>(args)
}

fn template_project(log: &Log) -> Result<Record> {
    let ev = decode::<MadeTemplateRequest>(log)?;
    Ok(record(vec![
        ("airnode", text(ev.airnode)),
        ("request", text(ev.requestId)),
        ("requester", text(ev.requester)),
        ("template", text(ev.templateId)),
        ("sponsor", text(ev.sponsor)),
    ]))
}

fn fulfilled_filter(args: &QueryArgs) -> Result<Filter> {
    airnode_request_filter::<FulfilledRequest>(args)
}

fn fulfilled_project(log: &Log) -> Result<Record> {
    let ev = decode::<FulfilledRequest>(log)?;
    Ok(record(vec![
        ("airnode", text(ev.airnode)),
        ("request", text(ev.requestId)),
        ("data", text(ev.data)),
    ]))
}

fn failed_filter(args: &QueryArgs) -> Result<Filter> {
    airnode_request_filter::<FailedRequest>(args)
}

fn failed_project(log: &Log) -> Result<Record> {
    let ev = decode::<FailedRequest>(log)?;
    Ok(record(vec![
        ("airnode", text(ev.airnode)),
        ("request", text(ev.requestId)),
        ("message", Value::String(ev.errorMessage)),
    ]))
}

// ---- Sponsorship ----

fn sponsor_filter(args: &QueryArgs) -> Result<Filter> {
    let mut filter = Filter::new().event_signature(SetSponsorshipStatus::SIGNATURE_HASH);
    if let Some(sponsor) = &args.sponsor {
        filter = filter.topic1(parse_address(sponsor)?.into_word());
    }
    if let Some(requester) = &args.requester {
        filter = filter.topic2(parse_address(requester)?.into_word());
    }
    Ok(filter)
}

fn sponsor_project(log: &Log) -> Result<Record> {
    let ev = decode::<SetSponsorshipStatus>(log)?;
    Ok(record(vec![
        ("sponsor", text(ev.sponsor)),
        ("requester", text(ev.requester)),
    ]))
}

// ---- dAPI server ----

fn name_filter(args: &QueryArgs) -> Result<Filter> {
    let mut filter = Filter::new().event_signature(SetDapiName::SIGNATURE_HASH);
    if let Some(name) = &args.dapi_name {
        filter = filter.topic1(parse_word(name)?);
    }
    if let Some(sender) = &args.sender {
        filter = filter.topic2(parse_address(sender)?.into_word());
    }
    Ok(filter)
}

fn name_project(log: &Log) -> Result<Record> {
    let ev = decode::<SetDapiName>(log)?;
    Ok(record(vec![
        ("name", text(ev.dapiName)),
        ("sender", text(ev.sender)),
        ("feed", text(ev.dataFeedId)),
    ]))
}

fn ubsd_filter(args: &QueryArgs) -> Result<Filter> {
    let mut filter = Filter::new().event_signature(UpdatedBeaconWithSignedData::SIGNATURE_HASH);
    if let Some(beacon) = &args.beacon {
        filter = filter.topic1(parse_word(beacon)?);
    }
    Ok(filter)
}

fn ubsd_project(log: &Log) -> Result<Record> {
    let ev = decode::<UpdatedBeaconWithSignedData>(log)?;
    Ok(record(vec![
        ("id", text(ev.beaconId)),
        ("value", text(ev.value)),
        ("timestamp", text(ev.timestamp)),
    ]))
}
