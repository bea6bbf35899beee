//! Named time series recorded during a run.

use std::collections::HashMap;
use std::io::Write;

use tn_core::kelvin_to_celsius;
use tn_network::{Network, NetworkError};

use crate::error::{SimError, SimResult};

/// Read-only snapshot handed to probes at each logged point.
///
/// Both slices are indexed by node ID and cover every node, references
/// included.
#[derive(Clone, Copy, Debug)]
pub struct StateView<'a> {
    pub time: f64,
    pub temperatures_k: &'a [f64],
    pub rates_k_per_s: &'a [f64],
}

type Probe = Box<dyn Fn(&StateView<'_>) -> f64 + Send + Sync>;

/// One recorded series.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signal {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl Signal {
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Most recent `(time, value)` sample.
    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.times.last()?, *self.values.last()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}

struct Entry {
    name: String,
    probe: Probe,
    signal: Signal,
}

/// Registry of probes and their recorded samples.
///
/// Probes are registered before a run; the solver appends one sample per
/// probe at every logged point and seals the log when the run ends.
#[derive(Default)]
pub struct SignalLog {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
    last_time: Option<f64>,
    sealed: bool,
    /// Node count of the network that node probes were resolved against.
    node_count: Option<usize>,
}

impl std::fmt::Debug for SignalLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalLog")
            .field("signals", &self.names().collect::<Vec<_>>())
            .field("samples", &self.len())
            .field("sealed", &self.sealed)
            .finish()
    }
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, probe: F) -> SimResult<()>
    where
        F: Fn(&StateView<'_>) -> f64 + Send + Sync + 'static,
    {
        if self.sealed {
            return Err(SimError::LogSealed);
        }
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(SimError::DuplicateSignal { name });
        }
        self.by_name.insert(name.clone(), self.entries.len());
        self.entries.push(Entry {
            name,
            probe: Box::new(probe),
            signal: Signal::default(),
        });
        Ok(())
    }

    /// Record the temperature (K) of `node`.
    pub fn register_temperature(
        &mut self,
        name: impl Into<String>,
        network: &Network,
        node: &str,
    ) -> SimResult<()> {
        let i = self.resolve(network, node)?;
        self.register(name, move |view| node_value(view.temperatures_k, i))
    }

    /// Record the temperature (°C) of `node`.
    pub fn register_temperature_celsius(
        &mut self,
        name: impl Into<String>,
        network: &Network,
        node: &str,
    ) -> SimResult<()> {
        let i = self.resolve(network, node)?;
        self.register(name, move |view| {
            kelvin_to_celsius(node_value(view.temperatures_k, i))
        })
    }

    /// Record the rise rate (K/s) of `node`.
    pub fn register_rise_rate(
        &mut self,
        name: impl Into<String>,
        network: &Network,
        node: &str,
    ) -> SimResult<()> {
        let i = self.resolve(network, node)?;
        self.register(name, move |view| node_value(view.rates_k_per_s, i))
    }

    /// Evaluate every probe at `view` and push the samples.
    pub fn append(&mut self, view: &StateView<'_>) -> SimResult<()> {
        if self.sealed {
            return Err(SimError::LogSealed);
        }
        if let Some(previous) = self.last_time {
            // NaN times fail here too
            if !(view.time > previous) {
                return Err(SimError::NonMonotonicTime {
                    previous,
                    time: view.time,
                });
            }
        }
        for entry in &mut self.entries {
            let value = (entry.probe)(view);
            entry.signal.times.push(view.time);
            entry.signal.values.push(value);
        }
        self.last_time = Some(view.time);
        Ok(())
    }

    /// Close the log; later `register` and `append` calls fail.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Node count of the network behind the node probes, if any were
    /// registered.
    pub fn node_count(&self) -> Option<usize> {
        self.node_count
    }

    /// Fail unless every node probe was resolved against a network with
    /// `node_count` nodes.
    pub fn check_network(&self, network: &Network) -> SimResult<()> {
        match self.node_count {
            Some(n) if n != network.node_count() => Err(SimError::invalid(
                "signal log",
                format!(
                    "node probes were registered on a {n}-node network, not this {}-node one",
                    network.node_count()
                ),
            )),
            _ => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> SimResult<&Signal> {
        self.by_name
            .get(name)
            .map(|&i| &self.entries[i].signal)
            .ok_or_else(|| SimError::UnknownSignal {
                name: name.to_string(),
            })
    }

    /// Signal names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of logged points (shared by every signal).
    pub fn len(&self) -> usize {
        self.entries.first().map_or(0, |e| e.signal.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve(&mut self, network: &Network, node: &str) -> SimResult<usize> {
        if self.sealed {
            return Err(SimError::LogSealed);
        }
        self.check_network(network)?;
        let i = network
            .node_id(node)
            .map(|id| id.index())
            .ok_or_else(|| NetworkError::UnknownNode {
                id: node.to_string(),
            })?;
        self.node_count = Some(network.node_count());
        Ok(i)
    }

    /// Write one signal as `time_s,<name>` CSV.
    pub fn write_csv(&self, name: &str, mut out: impl Write) -> SimResult<()> {
        let signal = self.get(name)?;
        writeln!(out, "time_s,{name}")?;
        for (t, v) in signal.iter() {
            writeln!(out, "{t},{v}")?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Out-of-range nodes read as NaN rather than panicking inside the probe.
fn node_value(values: &[f64], i: usize) -> f64 {
    values.get(i).copied().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tn_network::NetworkBuilder;

    fn network() -> Network {
        let mut b = NetworkBuilder::new();
        b.add_reference("ambient", 293.15).unwrap();
        b.add_mass("tank", 1000.0, 303.15).unwrap();
        b.add_link("tank", "ambient", 1.0).unwrap();
        b.build().unwrap()
    }

    fn view<'a>(time: f64, temps: &'a [f64], rates: &'a [f64]) -> StateView<'a> {
        StateView {
            time,
            temperatures_k: temps,
            rates_k_per_s: rates,
        }
    }

    #[test]
    fn convenience_probes_read_by_node_name() {
        let net = network();
        let mut log = SignalLog::new();
        log.register_temperature("T", &net, "tank").unwrap();
        log.register_temperature_celsius("T_C", &net, "tank").unwrap();
        log.register_rise_rate("dT", &net, "tank").unwrap();

        let tank = net.node_id("tank").unwrap().index();
        let mut temps = vec![293.15; 2];
        let mut rates = vec![0.0; 2];
        temps[tank] = 303.15;
        rates[tank] = 0.25;
        log.append(&view(0.0, &temps, &rates)).unwrap();

        assert_eq!(log.get("T").unwrap().last(), Some((0.0, 303.15)));
        let (_, c) = log.get("T_C").unwrap().last().unwrap();
        assert!((c - 30.0).abs() < 1e-9);
        assert_eq!(log.get("dT").unwrap().values(), &[0.25]);
    }

    #[test]
    fn unknown_node_is_rejected_at_registration() {
        let net = network();
        let mut log = SignalLog::new();
        let err = log.register_temperature("T", &net, "nope").unwrap_err();
        assert!(matches!(
            err,
            SimError::Network(NetworkError::UnknownNode { ref id }) if id == "nope"
        ));
    }

    #[test]
    fn node_probes_stay_on_one_network() {
        let net = network();
        let mut b = NetworkBuilder::new();
        b.add_reference("ambient", 293.15).unwrap();
        b.add_mass("a", 10.0, 300.0).unwrap();
        b.add_mass("c", 10.0, 300.0).unwrap();
        b.add_link("a", "ambient", 1.0).unwrap();
        b.add_link("c", "a", 1.0).unwrap();
        let bigger = b.build().unwrap();

        let mut log = SignalLog::new();
        assert_eq!(log.node_count(), None);
        log.register_temperature("T", &bigger, "c").unwrap();
        assert_eq!(log.node_count(), Some(3));
        assert!(log.check_network(&bigger).is_ok());
        assert!(matches!(
            log.check_network(&net),
            Err(SimError::InvalidParameter { .. })
        ));
        assert!(matches!(
            log.register_rise_rate("dT", &net, "tank"),
            Err(SimError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn short_view_reads_as_nan() {
        let mut b = NetworkBuilder::new();
        b.add_reference("ambient", 293.15).unwrap();
        b.add_mass("a", 10.0, 300.0).unwrap();
        b.add_mass("c", 10.0, 300.0).unwrap();
        b.add_link("a", "ambient", 1.0).unwrap();
        b.add_link("c", "a", 1.0).unwrap();
        let net = b.build().unwrap();

        let mut log = SignalLog::new();
        log.register_temperature("T", &net, "c").unwrap();
        log.append(&view(0.0, &[293.15, 300.0], &[0.0, 0.0])).unwrap();
        assert!(log.get("T").unwrap().values()[0].is_nan());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut log = SignalLog::new();
        log.register("x", |_| 0.0).unwrap();
        assert!(matches!(
            log.register("x", |_| 1.0),
            Err(SimError::DuplicateSignal { .. })
        ));
    }

    #[test]
    fn times_must_strictly_increase() {
        let mut log = SignalLog::new();
        log.register("t", |v| v.time).unwrap();
        log.append(&view(1.0, &[], &[])).unwrap();
        assert!(matches!(
            log.append(&view(1.0, &[], &[])),
            Err(SimError::NonMonotonicTime { .. })
        ));
        assert!(log.append(&view(0.5, &[], &[])).is_err());
        log.append(&view(2.0, &[], &[])).unwrap();
        assert_eq!(log.get("t").unwrap().times(), &[1.0, 2.0]);
    }

    #[test]
    fn sealed_log_refuses_changes() {
        let mut log = SignalLog::new();
        log.register("t", |v| v.time).unwrap();
        log.seal();
        assert!(log.is_sealed());
        assert!(matches!(log.register("u", |_| 0.0), Err(SimError::LogSealed)));
        assert!(matches!(
            log.append(&view(0.0, &[], &[])),
            Err(SimError::LogSealed)
        ));
    }

    #[test]
    fn unknown_signal_lookup_fails() {
        let log = SignalLog::new();
        assert!(matches!(
            log.get("missing"),
            Err(SimError::UnknownSignal { .. })
        ));
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let mut log = SignalLog::new();
        log.register("Temp", |v| 2.0 * v.time).unwrap();
        log.append(&view(0.0, &[], &[])).unwrap();
        log.append(&view(1.5, &[], &[])).unwrap();

        let mut buf = Vec::new();
        log.write_csv("Temp", &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "time_s,Temp\n0,0\n1.5,3\n");
    }
}
