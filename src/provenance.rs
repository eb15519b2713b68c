/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Provenance recording in the W3C PROV data model.
//!
//! Each produced value becomes an `Entity`, each function invocation an
//! `Activity`; `used` / `wasGeneratedBy` / `wasDerivedFrom` edges link
//! them. The graph accumulates during execution and is drained by the
//! caller; exports cover plain JSON, Turtle and JSON-LD.

use crate::catalog::FuncDef;
use crate::value::Value;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;

const PROV_NS: &str = "http://www.w3.org/ns/prov#";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
const DEFAULT_NAMESPACE: &str = "http://example.org/provenance/";

/// One recorded value.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    /// Opaque id, unique within one graph.
    pub id: String,
    /// Producing type name.
    pub type_name: String,
    /// Rendered value.
    pub value: String,
    /// ISO-8601 creation timestamp.
    pub timestamp: String,
}

/// One recorded function invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    /// Opaque id, unique within one graph.
    pub id: String,
    /// Invoked function name.
    pub func_id: String,
    /// Invoked function signature.
    pub func_signature: String,
    /// ISO-8601 start timestamp.
    pub started_at: String,
    /// ISO-8601 end timestamp (set once the invocation returns).
    pub ended_at: Option<String>,
}

/// One responsible agent.
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    /// Opaque id, unique within one graph.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Agent classification (`system`, `user`, `service`).
    pub agent_type: String,
}

/// `prov:used` edge.
#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    /// Using activity id.
    pub activity: String,
    /// Used entity id.
    pub entity: String,
    /// Usage role (`arg0`, `arg1`, ...).
    pub role: String,
    /// ISO-8601 timestamp.
    pub time: String,
}

/// `prov:wasGeneratedBy` edge.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    /// Generated entity id.
    pub entity: String,
    /// Generating activity id.
    pub activity: String,
    /// Generation role (`output`).
    pub role: String,
    /// ISO-8601 timestamp.
    pub time: String,
}

/// `prov:wasDerivedFrom` edge.
#[derive(Debug, Clone, Serialize)]
pub struct Derivation {
    /// Derived (output) entity id.
    pub derived: String,
    /// Source (input) entity id.
    pub source: String,
    /// Activity that performed the derivation.
    pub activity: Option<String>,
}

/// `prov:wasAssociatedWith` edge.
#[derive(Debug, Clone, Serialize)]
pub struct Association {
    /// Associated activity id.
    pub activity: String,
    /// Responsible agent id.
    pub agent: String,
}

/// Accumulated provenance records for one or more executions.
#[derive(Debug, Clone)]
pub struct ProvenanceGraph {
    namespace: String,
    entities: Vec<Entity>,
    activities: Vec<Activity>,
    agents: Vec<Agent>,
    usages: Vec<Usage>,
    generations: Vec<Generation>,
    derivations: Vec<Derivation>,
    associations: Vec<Association>,
    system_agent: String,
    next_entity: usize,
    next_activity: usize,
}

impl Default for ProvenanceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvenanceGraph {
    /// Creates an empty graph with the default namespace.
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    /// Creates an empty graph under a caller-chosen namespace.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        let mut graph = Self {
            namespace: namespace.into(),
            entities: Vec::new(),
            activities: Vec::new(),
            agents: Vec::new(),
            usages: Vec::new(),
            generations: Vec::new(),
            derivations: Vec::new(),
            associations: Vec::new(),
            system_agent: "system".to_string(),
            next_entity: 0,
            next_activity: 0,
        };
        graph.agents.push(Agent {
            id: graph.system_agent.clone(),
            name: "pipesynth".to_string(),
            agent_type: "system".to_string(),
        });
        graph
    }

    /// Returns recorded entities in creation order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns recorded activities in creation order.
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Returns recorded agents.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Returns recorded `used` edges in order.
    pub fn usages(&self) -> &[Usage] {
        &self.usages
    }

    /// Returns recorded `wasGeneratedBy` edges in order.
    pub fn generations(&self) -> &[Generation] {
        &self.generations
    }

    /// Returns recorded `wasDerivedFrom` edges in order.
    pub fn derivations(&self) -> &[Derivation] {
        &self.derivations
    }

    /// Records one value entity and returns its id.
    pub(crate) fn add_entity(&mut self, type_name: &str, value: &Value) -> String {
        let id = format!("entity_{}", self.next_entity);
        self.next_entity += 1;
        self.entities.push(Entity {
            id: id.clone(),
            type_name: type_name.to_string(),
            value: value.to_string(),
            timestamp: now(),
        });
        id
    }

    /// Records one function invocation, associated with the system agent.
    pub(crate) fn begin_activity(&mut self, func: &FuncDef) -> String {
        let id = format!("activity_{}", self.next_activity);
        self.next_activity += 1;
        self.activities.push(Activity {
            id: id.clone(),
            func_id: func.name.clone(),
            func_signature: func.signature(),
            started_at: now(),
            ended_at: None,
        });
        self.associations.push(Association {
            activity: id.clone(),
            agent: self.system_agent.clone(),
        });
        id
    }

    /// Stamps the end timestamp of an activity.
    pub(crate) fn end_activity(&mut self, activity_id: &str) {
        if let Some(activity) = self
            .activities
            .iter_mut()
            .find(|activity| activity.id == activity_id)
        {
            activity.ended_at = Some(now());
        }
    }

    pub(crate) fn add_usage(&mut self, activity: &str, entity: &str, role: &str) {
        self.usages.push(Usage {
            activity: activity.to_string(),
            entity: entity.to_string(),
            role: role.to_string(),
            time: now(),
        });
    }

    pub(crate) fn add_generation(&mut self, entity: &str, activity: &str, role: &str) {
        self.generations.push(Generation {
            entity: entity.to_string(),
            activity: activity.to_string(),
            role: role.to_string(),
            time: now(),
        });
    }

    pub(crate) fn add_derivation(&mut self, derived: &str, source: &str, activity: &str) {
        self.derivations.push(Derivation {
            derived: derived.to_string(),
            source: source.to_string(),
            activity: Some(activity.to_string()),
        });
    }

    /// Returns the ancestor entity chain of `entity_id` (itself first).
    pub fn entity_lineage(&self, entity_id: &str) -> Vec<String> {
        let mut lineage = Vec::new();
        let mut current = Some(entity_id.to_string());
        while let Some(id) = current {
            if lineage.contains(&id) {
                break;
            }
            lineage.push(id.clone());
            current = self
                .derivations
                .iter()
                .find(|derivation| derivation.derived == id)
                .map(|derivation| derivation.source.clone());
        }
        lineage
    }

    /// Returns the chain of activities that generated `entity_id` and its
    /// ancestors.
    pub fn activity_chain(&self, entity_id: &str) -> Vec<String> {
        self.entity_lineage(entity_id)
            .into_iter()
            .filter_map(|id| {
                self.generations
                    .iter()
                    .find(|generation| generation.entity == id)
                    .map(|generation| generation.activity.clone())
            })
            .collect()
    }

    /// Builds the plain JSON export object.
    pub fn to_json(&self) -> serde_json::Value {
        let entities: serde_json::Map<String, serde_json::Value> = self
            .entities
            .iter()
            .map(|entity| {
                (
                    entity.id.clone(),
                    json!({
                        "id": entity.id,
                        "type": "Entity",
                        "prov:type": entity.type_name,
                        "value": entity.value,
                        "prov:generatedAtTime": entity.timestamp,
                    }),
                )
            })
            .collect();
        let activities: serde_json::Map<String, serde_json::Value> = self
            .activities
            .iter()
            .map(|activity| {
                let mut node = json!({
                    "id": activity.id,
                    "type": "Activity",
                    "func_id": activity.func_id,
                    "func_signature": activity.func_signature,
                    "prov:startedAtTime": activity.started_at,
                });
                if let Some(ended) = &activity.ended_at {
                    node["prov:endedAtTime"] = json!(ended);
                }
                (activity.id.clone(), node)
            })
            .collect();
        let agents: serde_json::Map<String, serde_json::Value> = self
            .agents
            .iter()
            .map(|agent| {
                (
                    agent.id.clone(),
                    json!({
                        "id": agent.id,
                        "type": "Agent",
                        "name": agent.name,
                        "agent_type": agent.agent_type,
                    }),
                )
            })
            .collect();

        json!({
            "namespace": self.namespace,
            "entities": entities,
            "activities": activities,
            "agents": agents,
            "usages": self.usages,
            "generations": self.generations,
            "derivations": self.derivations,
            "associations": self.associations,
        })
    }

    /// Exports the graph as pretty-printed JSON.
    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_json())
            .expect("provenance export is built from JSON-safe values")
    }

    /// Exports the graph in Turtle using the `prov:` vocabulary.
    pub fn export_turtle(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "@prefix prov: <{PROV_NS}> .");
        let _ = writeln!(out, "@prefix ex: <{}> .", self.namespace);
        let _ = writeln!(out, "@prefix xsd: <{XSD_NS}> .");
        let _ = writeln!(out);

        for entity in &self.entities {
            let _ = writeln!(out, "ex:{} a prov:Entity ;", entity.id);
            let _ = writeln!(out, "    prov:type \"{}\" ;", escape_turtle(&entity.type_name));
            let _ = writeln!(out, "    prov:value \"{}\" ;", escape_turtle(&entity.value));
            let _ = writeln!(
                out,
                "    prov:generatedAtTime \"{}\"^^xsd:dateTime .",
                entity.timestamp
            );
            let _ = writeln!(out);
        }

        for activity in &self.activities {
            let _ = writeln!(out, "ex:{} a prov:Activity ;", activity.id);
            let _ = writeln!(out, "    ex:funcId \"{}\" ;", escape_turtle(&activity.func_id));
            let _ = writeln!(
                out,
                "    ex:funcSignature \"{}\" ;",
                escape_turtle(&activity.func_signature)
            );
            let _ = write!(
                out,
                "    prov:startedAtTime \"{}\"^^xsd:dateTime",
                activity.started_at
            );
            if let Some(ended) = &activity.ended_at {
                let _ = write!(out, " ;\n    prov:endedAtTime \"{ended}\"^^xsd:dateTime");
            }
            let _ = writeln!(out, " .");
            let _ = writeln!(out);
        }

        for agent in &self.agents {
            let _ = writeln!(out, "ex:{} a prov:Agent ;", agent.id);
            let _ = writeln!(out, "    prov:name \"{}\" ;", escape_turtle(&agent.name));
            let _ = writeln!(out, "    ex:agentType \"{}\" .", escape_turtle(&agent.agent_type));
            let _ = writeln!(out);
        }

        for usage in &self.usages {
            let _ = writeln!(out, "ex:{} prov:used ex:{} ;", usage.activity, usage.entity);
            if !usage.role.is_empty() {
                let _ = writeln!(out, "    prov:hadRole \"{}\" ;", escape_turtle(&usage.role));
            }
            let _ = writeln!(out, "    prov:atTime \"{}\"^^xsd:dateTime .", usage.time);
            let _ = writeln!(out);
        }

        for generation in &self.generations {
            let _ = writeln!(
                out,
                "ex:{} prov:wasGeneratedBy ex:{} ;",
                generation.entity, generation.activity
            );
            if !generation.role.is_empty() {
                let _ = writeln!(
                    out,
                    "    prov:hadRole \"{}\" ;",
                    escape_turtle(&generation.role)
                );
            }
            let _ = writeln!(out, "    prov:atTime \"{}\"^^xsd:dateTime .", generation.time);
            let _ = writeln!(out);
        }

        for derivation in &self.derivations {
            let _ = write!(
                out,
                "ex:{} prov:wasDerivedFrom ex:{}",
                derivation.derived, derivation.source
            );
            if let Some(activity) = &derivation.activity {
                let _ = write!(
                    out,
                    " ;\n    prov:qualifiedDerivation [\n        a prov:Derivation ;\n        prov:entity ex:{} ;\n        prov:hadActivity ex:{activity}\n    ]",
                    derivation.source
                );
            }
            let _ = writeln!(out, " .");
            let _ = writeln!(out);
        }

        for association in &self.associations {
            let _ = writeln!(
                out,
                "ex:{} prov:wasAssociatedWith ex:{} .",
                association.activity, association.agent
            );
            let _ = writeln!(out);
        }

        out
    }

    /// Exports the graph as JSON-LD with a PROV-O context.
    pub fn export_jsonld(&self) -> String {
        let context = json!({
            "prov": PROV_NS,
            "ex": self.namespace,
            "xsd": XSD_NS,
            "Entity": "prov:Entity",
            "Activity": "prov:Activity",
            "Agent": "prov:Agent",
            "used": {"@id": "prov:used", "@type": "@id"},
            "wasGeneratedBy": {"@id": "prov:wasGeneratedBy", "@type": "@id"},
            "wasDerivedFrom": {"@id": "prov:wasDerivedFrom", "@type": "@id"},
            "wasAssociatedWith": {"@id": "prov:wasAssociatedWith", "@type": "@id"},
            "startedAtTime": {"@id": "prov:startedAtTime", "@type": "xsd:dateTime"},
            "endedAtTime": {"@id": "prov:endedAtTime", "@type": "xsd:dateTime"},
            "generatedAtTime": {"@id": "prov:generatedAtTime", "@type": "xsd:dateTime"},
        });

        let mut graph = Vec::new();
        for entity in &self.entities {
            let mut node = json!({
                "@id": format!("ex:{}", entity.id),
                "@type": "Entity",
                "prov:type": entity.type_name,
                "prov:value": entity.value,
                "generatedAtTime": entity.timestamp,
            });
            let derived: Vec<String> = self
                .derivations
                .iter()
                .filter(|derivation| derivation.derived == entity.id)
                .map(|derivation| format!("ex:{}", derivation.source))
                .collect();
            if !derived.is_empty() {
                node["wasDerivedFrom"] = json!(derived);
            }
            if let Some(generation) = self
                .generations
                .iter()
                .find(|generation| generation.entity == entity.id)
            {
                node["wasGeneratedBy"] = json!(format!("ex:{}", generation.activity));
            }
            graph.push(node);
        }

        for activity in &self.activities {
            let mut node = json!({
                "@id": format!("ex:{}", activity.id),
                "@type": "Activity",
                "ex:funcId": activity.func_id,
                "ex:funcSignature": activity.func_signature,
                "startedAtTime": activity.started_at,
            });
            if let Some(ended) = &activity.ended_at {
                node["endedAtTime"] = json!(ended);
            }
            let used: Vec<String> = self
                .usages
                .iter()
                .filter(|usage| usage.activity == activity.id)
                .map(|usage| format!("ex:{}", usage.entity))
                .collect();
            if !used.is_empty() {
                node["used"] = json!(used);
            }
            let associated: Vec<String> = self
                .associations
                .iter()
                .filter(|association| association.activity == activity.id)
                .map(|association| format!("ex:{}", association.agent))
                .collect();
            if !associated.is_empty() {
                node["wasAssociatedWith"] = json!(associated);
            }
            graph.push(node);
        }

        for agent in &self.agents {
            graph.push(json!({
                "@id": format!("ex:{}", agent.id),
                "@type": "Agent",
                "prov:name": agent.name,
                "ex:agentType": agent.agent_type,
            }));
        }

        let document = json!({
            "@context": context,
            "@graph": graph,
        });
        serde_json::to_string_pretty(&document)
            .expect("provenance export is built from JSON-safe values")
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn escape_turtle(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
