//! Module for parsing and representing CVRP instances.
//!
//! This module handles the CVRPLIB (TSPLIB95) text files and VRP-REP XML documents used
//! for the Capacitated VRP.
//! It supports Euclidean 2D distances and manages node coordinates, demands, the depot
//! and the vehicle capacity. Raw node ids from the file are normalized to contiguous
//! zero-based indices through a [`NodeIdMap`].

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// A node as read from an instance file, before index normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNode {
    /// Node identifier as written in the file
    pub id: usize,
    pub x: f64,
    pub y: f64,
    /// Demand of the node (ignored for the depot)
    pub demand: f64,
}

impl RawNode {
    pub fn new(id: usize, x: f64, y: f64, demand: f64) -> Self {
        RawNode { id, x, y, demand }
    }
}

/// Bijective mapping between raw node ids and zero-based node indices.
///
/// Index `i` corresponds to the `i`-th smallest raw id, so for the usual
/// contiguous numbering this is a plain subtraction of [`NodeIdMap::offset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdMap {
    raw_ids: Vec<usize>,
}

impl NodeIdMap {
    /// Build a mapping from raw ids. Fails on duplicates.
    pub fn new(ids: impl IntoIterator<Item = usize>) -> Result<Self> {
        let mut raw_ids: Vec<usize> = ids.into_iter().collect();
        raw_ids.sort_unstable();
        if let Some(pair) = raw_ids.windows(2).find(|w| w[0] == w[1]) {
            bail!("duplicate node id {}", pair[0]);
        }
        Ok(NodeIdMap { raw_ids })
    }

    /// Identity mapping for `len` nodes
    pub fn identity(len: usize) -> Self {
        NodeIdMap { raw_ids: (0..len).collect() }
    }

    /// Smallest raw id, subtracted during normalization
    pub fn offset(&self) -> usize {
        self.raw_ids.first().copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.raw_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_ids.is_empty()
    }

    /// Raw id of a normalized index
    #[inline]
    pub fn to_raw(&self, index: usize) -> usize {
        self.raw_ids[index]
    }

    /// Normalized index of a raw id
    pub fn to_index(&self, raw: usize) -> Option<usize> {
        self.raw_ids.binary_search(&raw).ok()
    }
}

/// Shared, read-only description of a CVRP instance.
///
/// Built once per run; the distance matrix is computed at construction and the
/// structure is never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ProblemData {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Best known solution cost, when the instance advertises one
    pub best_known: Option<f64>,
    coordinates: Vec<(f64, f64)>,
    distance_matrix: Vec<Vec<f64>>,
    capacity: f64,
    /// Demand per node index; the depot slot stays at zero and is never read
    demands: Vec<f64>,
    customers: Vec<usize>,
    depot: usize,
    ids: NodeIdMap,
}

impl ProblemData {
    /// Build an instance from already normalized data.
    ///
    /// `customer_demands` must hold exactly one `(index, demand)` entry per
    /// non-depot node.
    pub fn new(
        coordinates: Vec<(f64, f64)>,
        customer_demands: Vec<(usize, f64)>,
        capacity: f64,
        depot: usize,
    ) -> Result<Self> {
        let ids = NodeIdMap::identity(coordinates.len());
        Self::build(String::new(), coordinates, customer_demands, capacity, depot, ids)
    }

    /// Build an instance from raw nodes, normalizing their ids
    pub fn from_nodes(name: &str, nodes: &[RawNode], capacity: f64, depot_id: usize) -> Result<Self> {
        let ids = NodeIdMap::new(nodes.iter().map(|n| n.id))?;
        let depot = ids
            .to_index(depot_id)
            .with_context(|| format!("depot id {} has no coordinates", depot_id))?;

        let mut coordinates = vec![(0.0, 0.0); nodes.len()];
        let mut customer_demands = Vec::with_capacity(nodes.len().saturating_sub(1));
        for node in nodes {
            // ids were validated by NodeIdMap::new, lookup cannot fail
            let index = ids.to_index(node.id).unwrap_or_default();
            coordinates[index] = (node.x, node.y);
            if index != depot {
                customer_demands.push((index, node.demand));
            }
        }

        Self::build(name.to_string(), coordinates, customer_demands, capacity, depot, ids)
    }

    fn build(
        name: String,
        coordinates: Vec<(f64, f64)>,
        customer_demands: Vec<(usize, f64)>,
        capacity: f64,
        depot: usize,
        ids: NodeIdMap,
    ) -> Result<Self> {
        let n = coordinates.len();
        ensure!(depot < n, "depot index {} out of range for {} nodes", depot, n);
        ensure!(capacity.is_finite() && capacity > 0.0, "capacity must be positive, got {}", capacity);

        let mut demands = vec![0.0; n];
        let mut seen = HashSet::with_capacity(customer_demands.len());
        for &(index, demand) in &customer_demands {
            ensure!(index < n, "demand given for unknown node index {}", index);
            ensure!(index != depot, "demand given for the depot (index {})", index);
            ensure!(seen.insert(index), "duplicate demand for node index {}", index);
            ensure!(demand.is_finite() && demand >= 0.0, "invalid demand {} for node index {}", demand, index);
            demands[index] = demand;
        }

        let customers: Vec<usize> = (0..n).filter(|&i| i != depot).collect();
        ensure!(!customers.is_empty(), "instance has no customers");
        if let Some(missing) = customers.iter().find(|i| !seen.contains(i)) {
            bail!("missing demand for node index {}", missing);
        }

        let distance_matrix = compute_distance_matrix(&coordinates)?;

        Ok(ProblemData {
            name,
            comment: String::new(),
            best_known: None,
            coordinates,
            distance_matrix,
            capacity,
            demands,
            customers,
            depot,
            ids,
        })
    }

    /// Parse a CVRP instance file: VRP-REP XML for `.xml`, CVRPLIB text otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read instance file {}", path.display()))?;
        let parsed = if is_xml(path) { Self::from_vrprep_xml(&text) } else { Self::parse(&text) };
        let mut data = parsed.with_context(|| format!("cannot parse instance file {}", path.display()))?;
        if data.name.is_empty() {
            data.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }
        Ok(data)
    }

    /// Parse a CVRP instance from CVRPLIB text
    pub fn parse(text: &str) -> Result<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension: Option<usize> = None;
        let mut capacity: Option<f64> = None;
        let mut coords: Vec<(usize, f64, f64)> = Vec::new();
        let mut demands: Vec<(usize, f64)> = Vec::new();
        let mut depots: Vec<usize> = Vec::new();

        let mut section = Section::Header;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            let line_no = line_no + 1;

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if let Some(next) = Section::from_keyword(line) {
                section = next;
                continue;
            }

            if line.starts_with(|c: char| c.is_ascii_alphabetic()) {
                let (key, value) = line
                    .split_once(':')
                    .with_context(|| format!("line {}: expected 'KEY : value', got '{}'", line_no, line))?;
                let value = value.trim();
                match key.trim() {
                    "NAME" => name = value.to_string(),
                    "COMMENT" => comment = value.to_string(),
                    "TYPE" => ensure!(value == "CVRP", "line {}: expecting 'CVRP' as TYPE, got '{}'", line_no, value),
                    "DIMENSION" => {
                        dimension = Some(parse_number(value, line_no, "DIMENSION")?);
                    }
                    "EDGE_WEIGHT_TYPE" => ensure!(
                        value == "EUC_2D",
                        "line {}: expecting 'EUC_2D' as EDGE_WEIGHT_TYPE, got '{}'",
                        line_no,
                        value
                    ),
                    "CAPACITY" => capacity = Some(parse_number(value, line_no, "CAPACITY")?),
                    other => log::debug!("ignoring header key '{}'", other),
                }
                section = Section::Header;
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match section {
                Section::Coordinates => {
                    ensure!(parts.len() == 3, "line {}: unexpected coord data '{}'", line_no, line);
                    coords.push((
                        parse_number(parts[0], line_no, "node id")?,
                        parse_number(parts[1], line_no, "x coordinate")?,
                        parse_number(parts[2], line_no, "y coordinate")?,
                    ));
                }
                Section::Demands => {
                    ensure!(parts.len() == 2, "line {}: unexpected demand data '{}'", line_no, line);
                    demands.push((
                        parse_number(parts[0], line_no, "node id")?,
                        parse_number(parts[1], line_no, "demand")?,
                    ));
                }
                Section::Depots => {
                    let id: i64 = parse_number(parts[0], line_no, "depot id")?;
                    if id >= 0 {
                        depots.push(id as usize);
                    } else {
                        section = Section::Header;
                    }
                }
                Section::Header => bail!("line {}: data outside of any section: '{}'", line_no, line),
            }
        }

        let capacity = capacity.context("missing CAPACITY")?;
        ensure!(!coords.is_empty(), "missing NODE_COORD_SECTION");
        if let Some(dimension) = dimension {
            ensure!(
                coords.len() == dimension,
                "DIMENSION is {} but {} coordinates were read",
                dimension,
                coords.len()
            );
        }

        let depot_id = match depots.as_slice() {
            [] => {
                let first = coords.iter().map(|c| c.0).min().unwrap_or_default();
                log::warn!("no DEPOT_SECTION, using node {} as depot", first);
                first
            }
            [depot] => *depot,
            _ => bail!("multiple depots are not supported ({:?})", depots),
        };

        let mut nodes = Vec::with_capacity(coords.len());
        for &(id, x, y) in &coords {
            let demand = demands.iter().find(|(did, _)| *did == id).map(|(_, d)| *d);
            let demand = match demand {
                Some(d) => d,
                None if id == depot_id => 0.0,
                None => bail!("cannot find demand for node id {}", id),
            };
            nodes.push(RawNode::new(id, x, y, demand));
        }

        let mut data = Self::from_nodes(&name, &nodes, capacity, depot_id)?;
        data.best_known = parse_best_known(&comment);
        data.comment = comment;
        Ok(data)
    }

    /// Parse a CVRP instance from a VRP-REP XML document.
    ///
    /// Reads `node` coordinates (`cx`, `cy`), the `vehicle_profile` capacity and
    /// departure node, and one `request` quantity per customer. Requests name
    /// their node through the `node` attribute, or through `id` when absent.
    pub fn from_vrprep_xml(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text).context("malformed XML")?;
        let root = doc.root_element();

        let name = root
            .children()
            .find(|n| n.has_tag_name("info"))
            .and_then(|info| info.children().find(|n| n.has_tag_name("name")))
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        let mut coords = Vec::new();
        for node in root.descendants().filter(|n| n.has_tag_name("node")) {
            let id = xml_attribute(node, "id")?;
            coords.push((id, xml_child_value(node, "cx")?, xml_child_value(node, "cy")?));
        }
        ensure!(!coords.is_empty(), "no <node> elements");

        let profile = root
            .descendants()
            .find(|n| n.has_tag_name("vehicle_profile"))
            .context("missing <vehicle_profile>")?;
        let capacity: f64 = xml_child_value(profile, "capacity")?;
        let depot_id: usize = xml_child_value(profile, "departure_node")?;

        let mut demands = HashMap::new();
        for request in root.descendants().filter(|n| n.has_tag_name("request")) {
            let node_id: usize = if request.has_attribute("node") {
                xml_attribute(request, "node")?
            } else {
                xml_attribute(request, "id")?
            };
            let quantity: f64 = xml_child_value(request, "quantity")?;
            ensure!(demands.insert(node_id, quantity).is_none(), "duplicate request for node {}", node_id);
        }

        let mut nodes = Vec::with_capacity(coords.len());
        for &(id, x, y) in &coords {
            let demand = match demands.get(&id) {
                Some(&d) => d,
                None if id == depot_id => 0.0,
                None => bail!("no request for node {}", id),
            };
            nodes.push(RawNode::new(id, x, y, demand));
        }

        log::debug!("Read VRP-REP instance '{}' with {} nodes", name, nodes.len());
        Self::from_nodes(&name, &nodes, capacity, depot_id)
    }

    /// Get the distance between two nodes
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    pub fn coordinates(&self) -> &[(f64, f64)] {
        &self.coordinates
    }

    /// Demand of a customer node
    #[inline]
    pub fn demand(&self, node: usize) -> f64 {
        self.demands[node]
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    /// All customer indices in increasing order
    pub fn customers(&self) -> &[usize] {
        &self.customers
    }

    pub fn ids(&self) -> &NodeIdMap {
        &self.ids
    }

    /// Number of nodes (including depot)
    pub fn dimension(&self) -> usize {
        self.coordinates.len()
    }

    /// Number of customer nodes (excluding depot)
    pub fn num_customers(&self) -> usize {
        self.customers.len()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let total_demand: f64 = self.customers.iter().map(|&c| self.demands[c]).sum();
        let max_demand = self.customers.iter().map(|&c| self.demands[c]).fold(0.0, f64::max);

        let n = self.dimension();
        let mut sum = 0.0;
        let mut count = 0usize;
        let mut max_distance: f64 = 0.0;
        for i in 0..n {
            for j in i + 1..n {
                let d = self.distance(i, j);
                sum += d;
                count += 1;
                max_distance = max_distance.max(d);
            }
        }

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            num_customers: self.num_customers(),
            depot: self.ids.to_raw(self.depot),
            capacity: self.capacity,
            total_demand,
            max_demand,
            min_trips: (total_demand / self.capacity).ceil() as usize,
            avg_distance: if count > 0 { sum / count as f64 } else { 0.0 },
            max_distance,
            best_known: self.best_known,
        }
    }
}

impl std::str::FromStr for ProblemData {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Header,
    Coordinates,
    Demands,
    Depots,
}

impl Section {
    fn from_keyword(line: &str) -> Option<Section> {
        match line {
            "NODE_COORD_SECTION" => Some(Section::Coordinates),
            "DEMAND_SECTION" => Some(Section::Demands),
            "DEPOT_SECTION" => Some(Section::Depots),
            _ => None,
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, line_no: usize, what: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .ok()
        .with_context(|| format!("line {}: cannot parse {} from '{}'", line_no, what, value))
}

fn is_xml(path: &Path) -> bool {
    path.extension().map_or(false, |e| e.eq_ignore_ascii_case("xml"))
}

fn xml_attribute<T: std::str::FromStr>(node: roxmltree::Node, name: &str) -> Result<T> {
    let value = node
        .attribute(name)
        .with_context(|| format!("<{}> without '{}' attribute", node.tag_name().name(), name))?;
    value
        .trim()
        .parse()
        .ok()
        .with_context(|| format!("<{}>: cannot parse '{}' attribute from '{}'", node.tag_name().name(), name, value))
}

fn xml_child_value<T: std::str::FromStr>(node: roxmltree::Node, tag: &str) -> Result<T> {
    let value = node
        .children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
        .with_context(|| format!("<{}> without <{}>", node.tag_name().name(), tag))?;
    value
        .trim()
        .parse()
        .ok()
        .with_context(|| format!("<{}>: cannot parse <{}> from '{}'", node.tag_name().name(), tag, value))
}

/// Extract "Optimal value: 784" or "Best value: 784" from an instance comment
fn parse_best_known(comment: &str) -> Option<f64> {
    ["Optimal value:", "Best value:"].iter().find_map(|marker| {
        let start = comment.find(marker)? + marker.len();
        let digits: String = comment[start..]
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        digits.parse().ok()
    })
}

/// Compute Euclidean distance matrix
pub fn compute_distance_matrix(coordinates: &[(f64, f64)]) -> Result<Vec<Vec<f64>>> {
    ensure!(!coordinates.is_empty(), "cannot build a distance matrix without coordinates");

    let n = coordinates.len();
    let mut matrix = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in i + 1..n {
            let dx = coordinates[i].0 - coordinates[j].0;
            let dy = coordinates[i].1 - coordinates[j].1;
            let d = (dx * dx + dy * dy).sqrt();
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }

    Ok(matrix)
}

/// Helper function to load instances from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<ProblemData>> {
    let dir = dir.as_ref();
    let mut instances = Vec::new();

    let entries = fs::read_dir(dir).with_context(|| format!("cannot read directory {}", dir.display()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "vrp") || is_xml(&path) {
            match ProblemData::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => log::warn!("skipping {}: {:#}", path.display(), e),
            }
        }
    }

    // Sort by dimension
    instances.sort_by_key(|i| i.dimension());

    Ok(instances)
}

/// Statistics about a CVRP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub num_customers: usize,
    /// Raw id of the depot
    pub depot: usize,
    pub capacity: f64,
    pub total_demand: f64,
    pub max_demand: f64,
    /// Lower bound on the number of trips: ceil(total demand / capacity)
    pub min_trips: usize,
    pub avg_distance: f64,
    pub max_distance: f64,
    pub best_known: Option<f64>,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Nodes: {} (1 depot + {} customers)", self.dimension, self.num_customers)?;
        writeln!(f, "  Depot: {}", self.depot)?;
        writeln!(f, "  Capacity: {}", self.capacity)?;
        writeln!(f, "  Total demand: {} (max {})", self.total_demand, self.max_demand)?;
        writeln!(f, "  Minimum trips: {}", self.min_trips)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)?;
        if let Some(best) = self.best_known {
            writeln!(f, "  Best known: {:.2}", best)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_VRP: &str = "\
NAME : toy-n5-k2
COMMENT : (hand made, No of trucks: 2, Optimal value: 12)
TYPE : CVRP
DIMENSION : 5
EDGE_WEIGHT_TYPE : EUC_2D
CAPACITY : 10
NODE_COORD_SECTION
 1 0 0
 2 3 4
 3 6 0
 4 0 5
 5 -3 -4
DEMAND_SECTION
1 0
2 4
3 6
4 3
5 7
DEPOT_SECTION
 1
 -1
EOF
";

    const SMALL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<instance>
  <info>
    <dataset>toy</dataset>
    <name>toy-n5-k2</name>
  </info>
  <network>
    <nodes>
      <node id="1" type="0"><cx>0.0</cx><cy>0.0</cy></node>
      <node id="2" type="1"><cx>3.0</cx><cy>4.0</cy></node>
      <node id="3" type="1"><cx>6.0</cx><cy>0.0</cy></node>
      <node id="4" type="1"><cx>0.0</cx><cy>5.0</cy></node>
      <node id="5" type="1"><cx>-3.0</cx><cy>-4.0</cy></node>
    </nodes>
    <euclidean/>
  </network>
  <fleet>
    <vehicle_profile type="0">
      <departure_node>1</departure_node>
      <arrival_node>1</arrival_node>
      <capacity>10.0</capacity>
    </vehicle_profile>
  </fleet>
  <requests>
    <request id="2" node="2"><quantity>4.0</quantity></request>
    <request id="3" node="3"><quantity>6.0</quantity></request>
    <request id="4" node="4"><quantity>3.0</quantity></request>
    <request id="5" node="5"><quantity>7.0</quantity></request>
  </requests>
</instance>
"#;

    #[test]
    fn test_distance_calculation() {
        let matrix = compute_distance_matrix(&[(0.0, 0.0), (3.0, 4.0)]).unwrap();

        assert!((matrix[0][1] - 5.0).abs() < 1e-10);
        assert!((matrix[1][0] - 5.0).abs() < 1e-10);
        assert_eq!(matrix[0][0], 0.0);
    }

    #[test]
    fn test_distance_matrix_requires_coordinates() {
        assert!(compute_distance_matrix(&[]).is_err());
    }

    #[test]
    fn test_parse_cvrplib() {
        let data = ProblemData::parse(SMALL_VRP).unwrap();

        assert_eq!(data.name, "toy-n5-k2");
        assert_eq!(data.dimension(), 5);
        assert_eq!(data.num_customers(), 4);
        assert_eq!(data.depot(), 0);
        assert_eq!(data.customers(), &[1, 2, 3, 4]);
        assert_eq!(data.capacity(), 10.0);
        assert_eq!(data.demand(2), 6.0);
        assert_eq!(data.ids().offset(), 1);
        assert_eq!(data.ids().to_raw(4), 5);
        assert_eq!(data.best_known, Some(12.0));
        assert!((data.distance(0, 1) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_vrprep_xml() {
        let data = ProblemData::from_vrprep_xml(SMALL_XML).unwrap();
        let text = ProblemData::parse(SMALL_VRP).unwrap();

        assert_eq!(data.name, "toy-n5-k2");
        assert_eq!(data.depot(), 0);
        assert_eq!(data.customers(), text.customers());
        assert_eq!(data.capacity(), 10.0);
        assert_eq!(data.ids(), text.ids());
        for c in data.customers() {
            assert_eq!(data.demand(*c), text.demand(*c));
            assert!((data.distance(0, *c) - text.distance(0, *c)).abs() < 1e-10);
        }
    }

    #[test]
    fn test_vrprep_request_id_and_missing_fields() {
        // without a node attribute the request id names the node
        let by_id = SMALL_XML.replace(" node=\"3\"", "");
        let data = ProblemData::from_vrprep_xml(&by_id).unwrap();
        assert_eq!(data.demand(2), 6.0);

        let no_capacity = SMALL_XML.replace("<capacity>10.0</capacity>", "");
        let err = ProblemData::from_vrprep_xml(&no_capacity).unwrap_err();
        assert!(format!("{:#}", err).contains("capacity"));

        let no_request = SMALL_XML.replace(r#"<request id="4" node="4"><quantity>3.0</quantity></request>"#, "");
        assert!(ProblemData::from_vrprep_xml(&no_request).is_err());

        assert!(ProblemData::from_vrprep_xml("<instance>").is_err());
    }

    #[test]
    fn test_load_dir_reads_both_formats() {
        let dir = std::env::temp_dir().join(format!("cvrp-instances-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.vrp"), SMALL_VRP).unwrap();
        fs::write(dir.join("b.xml"), SMALL_XML).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let from_xml = ProblemData::from_file(dir.join("b.xml")).unwrap();
        assert_eq!(from_xml.num_customers(), 4);

        let instances = load_instances_from_dir(&dir).unwrap();
        assert_eq!(instances.len(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_capacity_is_fatal() {
        let text = SMALL_VRP.replace("CAPACITY : 10\n", "");
        let err = ProblemData::parse(&text).unwrap_err();
        assert!(format!("{:#}", err).contains("CAPACITY"));
    }

    #[test]
    fn test_unparsable_coordinate_is_fatal() {
        let text = SMALL_VRP.replace(" 3 6 0", " 3 six 0");
        let err = ProblemData::parse(&text).unwrap_err();
        assert!(format!("{:#}", err).contains("x coordinate"));
    }

    #[test]
    fn test_missing_demand_is_fatal() {
        let text = SMALL_VRP.replace("4 3\n", "");
        assert!(ProblemData::parse(&text).is_err());
    }

    #[test]
    fn test_node_id_map_is_bijective() {
        let map = NodeIdMap::new(vec![12, 10, 11]).unwrap();
        assert_eq!(map.offset(), 10);
        for index in 0..map.len() {
            assert_eq!(map.to_index(map.to_raw(index)), Some(index));
        }
        assert_eq!(map.to_index(9), None);
        assert!(NodeIdMap::new(vec![1, 1]).is_err());
    }

    #[test]
    fn test_invalid_construction() {
        let coords = vec![(0.0, 0.0), (1.0, 0.0)];
        assert!(ProblemData::new(coords.clone(), vec![(1, 1.0)], 0.0, 0).is_err());
        assert!(ProblemData::new(coords.clone(), vec![(0, 1.0), (1, 1.0)], 5.0, 0).is_err());
        assert!(ProblemData::new(coords.clone(), vec![(1, 1.0), (1, 2.0)], 5.0, 0).is_err());
        assert!(ProblemData::new(coords, vec![], 5.0, 0).is_err());
    }

    #[test]
    fn test_statistics() {
        let data = ProblemData::parse(SMALL_VRP).unwrap();
        let stats = data.statistics();
        assert_eq!(stats.total_demand, 20.0);
        assert_eq!(stats.min_trips, 2);
        assert_eq!(stats.depot, 1);
    }
}
