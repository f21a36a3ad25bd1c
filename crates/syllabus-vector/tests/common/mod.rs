use syllabus_core::{ChunkRecord, Source, Unit};

pub fn record(unit: Unit, source: Source, page: u32, text: &str) -> ChunkRecord {
    ChunkRecord { unit, topic: format!("{unit} topic"), source, page, text: text.to_string() }
}

/// A small networking corpus; primary passages first, as the loader orders them.
pub fn networking_corpus() -> Vec<ChunkRecord> {
    vec![
        record(Unit::Unit4, Source::Primary, 210, "TCP is the Transmission Control Protocol, a reliable transport protocol."),
        record(Unit::Unit2, Source::Primary, 88, "Ethernet uses CSMA/CD to share a broadcast medium between stations."),
        record(Unit::Unit3, Source::Primary, 140, "Routers forward datagrams using routing tables built by routing protocols."),
        record(Unit::Unit5, Source::Primary, 301, "SNMP agents expose a MIB that managers poll for network monitoring."),
        record(Unit::Unit4, Source::Secondary, 233, "The TCP three way handshake performs connection establishment before data transfer."),
        record(Unit::Unit4, Source::Secondary, 240, "TCP congestion control adjusts the transmission window of the protocol."),
        record(Unit::Unit1, Source::Secondary, 12, "The OSI reference model splits network protocol architecture into seven layers."),
        record(Unit::Unit3, Source::Secondary, 150, "Distance vector routing algorithm path selection exchanges tables with neighbours."),
    ]
}
