use serde_json::{json, Value};
use venture_criteria::{FilterMap, Schema};

pub const PERSONAS: &str = "BswPersonas";

/// Personas and their country, mapped onto the `inv` schema tables.
pub const SCHEMA_JSON: &str = r#"{
    "entities": {
        "BswPersonas": {
            "table": "inv.bsw_personas",
            "attributes": {
                "id": {"type": "long"},
                "codPersona": {"column": "cod_persona", "type": "text"},
                "nombre": {"type": "text"},
                "ruc": {"type": "text"},
                "direccion": {"type": "text"},
                "telefono": {"type": "text"},
                "fecNacimiento": {"column": "fec_nacimiento", "type": "date"},
                "esFisica": {"column": "es_fisica", "type": "boolean"},
                "saldo": {"type": "decimal"}
            },
            "relations": {
                "pais": {"target": "BswPaises", "foreign_key": "pais_id"}
            }
        },
        "BswPaises": {
            "table": "inv.bsw_paises",
            "attributes": {
                "id": {"type": "long"},
                "codPais": {"column": "cod_pais", "type": "text"},
                "descripcion": {"type": "text"},
                "nacionalidad": {"type": "text"}
            }
        }
    }
}"#;

pub fn schema() -> Schema {
    Schema::from_json_str(SCHEMA_JSON).unwrap_or_else(|e| panic!("fixture schema: {}", e))
}

fn paraguay() -> Value {
    json!({"id": 1, "codPais": "PY", "descripcion": "PARAGUAY", "nacionalidad": "PARAGUAYA"})
}

/// Five personas; `P004` has no country.
pub fn personas() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "codPersona": "P001",
            "nombre": "JUAN PEREZ",
            "ruc": "80012345-6",
            "direccion": "Av. Mcal. López 1234",
            "fecNacimiento": "1985-03-12",
            "esFisica": true,
            "saldo": "1500.50",
            "pais": paraguay()
        }),
        json!({
            "id": 2,
            "codPersona": "P002",
            "nombre": "María González",
            "ruc": null,
            "direccion": "Calle Florida 100",
            "fecNacimiento": "1990-07-01",
            "esFisica": true,
            "saldo": 0,
            "pais": {"id": 2, "codPais": "AR", "descripcion": "ARGENTINA", "nacionalidad": "ARGENTINA"}
        }),
        json!({
            "id": 3,
            "codPersona": "P003",
            "nombre": "Comercial Juanita S.A.",
            "ruc": "80098765-1",
            "direccion": null,
            "fecNacimiento": null,
            "esFisica": false,
            "saldo": "-20.00",
            "pais": paraguay()
        }),
        json!({
            "id": 4,
            "codPersona": "P004",
            "nombre": "Pedro Benítez",
            "ruc": "1234567",
            "direccion": "Ruta 2 km 30",
            "fecNacimiento": "1999-12-31",
            "esFisica": true,
            "saldo": 10,
            "pais": null
        }),
        json!({
            "id": 5,
            "codPersona": "P005",
            "nombre": "Ana Duarte",
            "ruc": null,
            "direccion": "Rua Paraguai 77",
            "fecNacimiento": "1990-01-01",
            "esFisica": true,
            "saldo": "99.99",
            "pais": {"id": 3, "codPais": "BR", "descripcion": "BRASIL", "nacionalidad": "BRASILEÑA"}
        }),
    ]
}

/// Filter mapping from a JSON object literal.
pub fn filters(value: Value) -> FilterMap {
    serde_json::from_value(value).unwrap_or_else(|e| panic!("fixture filters: {}", e))
}
