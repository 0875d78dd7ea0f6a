use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use quick_xml::Writer;

use crate::error::ErrorKind;
use crate::error::Result;

use super::HaDescriptor;
use super::HaServiceConfig;
use super::PARAM_ENABLED;
use super::PARAM_FAILOVER_SLEEP;
use super::PARAM_MAX_FAILOVER_ATTEMPTS;
use super::PARAM_MAX_RETRY_ATTEMPTS;
use super::PARAM_RETRY_SLEEP;
use super::PARAM_ZOOKEEPER_ENSEMBLE;
use super::PARAM_ZOOKEEPER_NAMESPACE;

const ELEMENT_ROOT: &[u8] = b"ha";
const ELEMENT_SERVICE: &[u8] = b"service";
const ATTRIBUTE_NAME: &str = "name";

/// Parse an HA descriptor from its XML document form.
pub fn load(document: &str) -> Result<HaDescriptor> {
    let mut reader = Reader::from_str(document);
    reader.trim_text(true);
    let mut descriptor = HaDescriptor::new();
    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event(&mut buf)
            .map_err(|_| parse_error(document, reader.buffer_position()))?;
        match event {
            Event::Start(ref element) | Event::Empty(ref element) => {
                if element.name() == ELEMENT_SERVICE {
                    let config = parse_service(document, &reader, element)?;
                    descriptor.add_service_config(config);
                }
            }
            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }
    Ok(descriptor)
}

/// Serialize an HA descriptor to its XML document form.
///
/// Attributes are emitted in alphabetical order and every configured
/// field is written out explicitly so stored documents are diffable.
pub fn store(descriptor: &HaDescriptor) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Start(BytesStart::borrowed_name(ELEMENT_ROOT)))
        .map_err(|_| ErrorKind::DescriptorEncode)?;
    for config in descriptor.service_configs() {
        let enabled = config.enabled().to_string();
        let failover_sleep = config.failover_sleep().to_string();
        let max_failover_attempts = config.max_failover_attempts().to_string();
        let max_retry_attempts = config.max_retry_attempts().to_string();
        let retry_sleep = config.retry_sleep().to_string();
        let mut element = BytesStart::borrowed_name(ELEMENT_SERVICE);
        element.push_attribute((PARAM_ENABLED, enabled.as_str()));
        element.push_attribute((PARAM_FAILOVER_SLEEP, failover_sleep.as_str()));
        element.push_attribute((PARAM_MAX_FAILOVER_ATTEMPTS, max_failover_attempts.as_str()));
        element.push_attribute((PARAM_MAX_RETRY_ATTEMPTS, max_retry_attempts.as_str()));
        element.push_attribute((ATTRIBUTE_NAME, config.service_name()));
        element.push_attribute((PARAM_RETRY_SLEEP, retry_sleep.as_str()));
        if let Some(ensemble) = config.zookeeper_ensemble() {
            element.push_attribute((PARAM_ZOOKEEPER_ENSEMBLE, ensemble));
        }
        if let Some(namespace) = config.zookeeper_namespace() {
            element.push_attribute((PARAM_ZOOKEEPER_NAMESPACE, namespace));
        }
        writer
            .write_event(Event::Empty(element))
            .map_err(|_| ErrorKind::DescriptorEncode)?;
    }
    writer
        .write_event(Event::End(BytesEnd::borrowed(ELEMENT_ROOT)))
        .map_err(|_| ErrorKind::DescriptorEncode)?;
    String::from_utf8(writer.into_inner()).map_err(|_| ErrorKind::DescriptorEncode.into())
}

fn parse_service(
    document: &str,
    reader: &Reader<&[u8]>,
    element: &BytesStart,
) -> Result<HaServiceConfig> {
    let mut name = None;
    let mut enabled = None;
    let mut max_failover_attempts = None;
    let mut failover_sleep = None;
    let mut max_retry_attempts = None;
    let mut retry_sleep = None;
    let mut zookeeper_ensemble = None;
    let mut zookeeper_namespace = None;
    for attribute in element.attributes() {
        let attribute =
            attribute.map_err(|_| parse_error(document, reader.buffer_position()))?;
        let value = attribute
            .unescape_and_decode_value(reader)
            .map_err(|_| parse_error(document, reader.buffer_position()))?;
        match attribute.key {
            key if key == ATTRIBUTE_NAME.as_bytes() => name = Some(value),
            key if key == PARAM_ENABLED.as_bytes() => enabled = Some(value),
            key if key == PARAM_MAX_FAILOVER_ATTEMPTS.as_bytes() => {
                max_failover_attempts = Some(value)
            }
            key if key == PARAM_FAILOVER_SLEEP.as_bytes() => failover_sleep = Some(value),
            key if key == PARAM_MAX_RETRY_ATTEMPTS.as_bytes() => max_retry_attempts = Some(value),
            key if key == PARAM_RETRY_SLEEP.as_bytes() => retry_sleep = Some(value),
            key if key == PARAM_ZOOKEEPER_ENSEMBLE.as_bytes() => zookeeper_ensemble = Some(value),
            key if key == PARAM_ZOOKEEPER_NAMESPACE.as_bytes() => zookeeper_namespace = Some(value),
            _ => (),
        }
    }
    let name = name.ok_or(ErrorKind::MissingAttribute(ATTRIBUTE_NAME))?;
    HaServiceConfig::from_fields(
        name,
        enabled.as_deref(),
        max_failover_attempts.as_deref(),
        failover_sleep.as_deref(),
        max_retry_attempts.as_deref(),
        retry_sleep.as_deref(),
        zookeeper_ensemble.as_deref(),
        zookeeper_namespace.as_deref(),
    )
    .map_err(|error| match error.kind() {
        ErrorKind::InvalidParam(key, value) => ErrorKind::InvalidAttribute(key, value).into(),
        _ => error,
    })
}

/// Convert a byte offset reported by the reader into a line/column error.
fn parse_error(document: &str, position: usize) -> crate::error::Error {
    let position = position.min(document.len());
    let consumed = &document.as_bytes()[..position];
    let line = consumed.iter().filter(|byte| **byte == b'\n').count() + 1;
    let column = match consumed.iter().rposition(|byte| *byte == b'\n') {
        Some(newline) => position - newline,
        None => position + 1,
    };
    ErrorKind::DescriptorParse(line, column).into()
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::super::HaDescriptor;
    use super::super::HaServiceConfig;

    #[test]
    fn load_explicit_and_default_services() {
        let xml = "<ha>\
                   <service name='foo' maxFailoverAttempts='42' failoverSleep='4000' \
                   maxRetryAttempts='2' retrySleep='2213' enabled='false'/>\
                   <service name='bar' enabled='true'/>\
                   </ha>";
        let descriptor = HaDescriptor::load(xml).unwrap();
        assert_eq!(descriptor.enabled_service_names(), vec!["bar".to_string()]);
        let foo = descriptor.service_config("foo").unwrap();
        assert_eq!(foo.service_name(), "foo");
        assert_eq!(foo.max_failover_attempts(), 42);
        assert_eq!(foo.failover_sleep(), 4000);
        assert_eq!(foo.max_retry_attempts(), 2);
        assert_eq!(foo.retry_sleep(), 2213);
        assert!(!foo.enabled());
        let bar = descriptor.service_config("bar").unwrap();
        assert!(bar.enabled());
        assert_eq!(bar.max_failover_attempts(), 3);
        assert_eq!(bar.failover_sleep(), 1000);
        assert_eq!(bar.max_retry_attempts(), 3);
        assert_eq!(bar.retry_sleep(), 1000);
    }

    #[test]
    fn load_missing_name_is_rejected() {
        let xml = "<ha><service enabled='true'/></ha>";
        let error = HaDescriptor::load(xml).err().expect("load should fail");
        assert_eq!(error.kind(), ErrorKind::MissingAttribute("name"));
    }

    #[test]
    fn load_invalid_number_is_rejected() {
        let xml = "<ha><service name='foo' failoverSleep='soon'/></ha>";
        let error = HaDescriptor::load(xml).err().expect("load should fail");
        assert_eq!(
            error.kind(),
            ErrorKind::InvalidAttribute("failoverSleep".into(), "soon".into())
        );
    }

    #[test]
    fn load_malformed_document_reports_position() {
        let xml = "<ha>\n<service name='foo'></ha>";
        let error = HaDescriptor::load(xml).err().expect("load should fail");
        match error.kind() {
            ErrorKind::DescriptorParse(line, column) => {
                assert_eq!(line, 2);
                assert!(column > 0);
            }
            kind => panic!("unexpected error: {:?}", kind),
        }
    }

    #[test]
    fn store_is_deterministic() {
        let mut descriptor = HaDescriptor::new();
        descriptor.add_service_config(
            HaServiceConfig::from_params("foo", "enabled=true;maxFailoverAttempts=5").unwrap(),
        );
        assert_eq!(descriptor.store().unwrap(), descriptor.store().unwrap());
    }

    #[test]
    fn store_emits_alphabetical_attributes() {
        let mut descriptor = HaDescriptor::new();
        descriptor.add_service_config(
            HaServiceConfig::from_fields(
                "foo",
                Some("false"),
                Some("42"),
                Some("1000"),
                None,
                None,
                Some("foo:2181,bar:2181"),
                Some("hiveserver2"),
            )
            .unwrap(),
        );
        let xml = descriptor.store().unwrap();
        assert!(xml.contains(
            "<service enabled=\"false\" failoverSleep=\"1000\" maxFailoverAttempts=\"42\" \
             maxRetryAttempts=\"3\" name=\"foo\" retrySleep=\"1000\" \
             zookeeperEnsemble=\"foo:2181,bar:2181\" zookeeperNamespace=\"hiveserver2\"/>"
        ));
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let mut descriptor = HaDescriptor::new();
        descriptor.add_service_config(
            HaServiceConfig::from_params(
                "foo",
                "enabled=true;maxFailoverAttempts=7;failoverSleep=20;\
                 maxRetryAttempts=9;retrySleep=30;\
                 zookeeperEnsemble=zk1:2181,zk2:2181;zookeeperNamespace=hiveserver2",
            )
            .unwrap(),
        );
        descriptor.add_service_config(HaServiceConfig::from_params("bar", "").unwrap());
        let stored = descriptor.store().unwrap();
        let loaded = HaDescriptor::load(&stored).unwrap();
        assert_eq!(loaded, descriptor);
    }
}
