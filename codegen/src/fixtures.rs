use serde_json::{Value, json};

use crate::loader::SpecDocument;

fn request_envelope(method: &str, params: Value) -> Value {
    json!({
        "type": "object",
        "required": ["jsonrpc", "id", "method", "params"],
        "properties": {
            "jsonrpc": { "type": "string" },
            "id": { "type": "string" },
            "method": { "type": "string", "enum": [method] },
            "params": params
        }
    })
}

fn response_envelope(result: Value) -> Value {
    json!({
        "type": "object",
        "required": ["jsonrpc", "id"],
        "properties": {
            "jsonrpc": { "type": "string" },
            "id": { "type": "string" }
        },
        "oneOf": [
            { "type": "object", "required": ["result"], "properties": { "result": result } },
            {
                "type": "object",
                "required": ["error"],
                "properties": { "error": { "$ref": "#/components/schemas/RpcError" } }
            }
        ]
    })
}

fn operation(operation_id: &str, request: &str, response: &str) -> Value {
    json!({
        "post": {
            "operationId": operation_id,
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": { "schema": { "$ref": format!("#/components/schemas/{request}") } }
                }
            },
            "responses": {
                "200": {
                    "description": "",
                    "content": {
                        "application/json": { "schema": { "$ref": format!("#/components/schemas/{response}") } }
                    }
                }
            }
        }
    })
}

/// A small NEAR-shaped document covering envelopes, inline bodies, unions,
/// nullable params and a prefixed operation id.
pub(crate) fn near_document() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": { "title": "NEAR Protocol JSON RPC API", "version": "1.0.0" },
        "paths": {
            "/block": operation(
                "block",
                "JsonRpcRequest_for_block",
                "JsonRpcResponse_for_RpcBlockResponse_and_RpcError"
            ),
            "/health": operation(
                "health",
                "JsonRpcRequest_for_health",
                "JsonRpcResponse_for_Nullable_RpcHealthResponse_and_RpcError"
            ),
            "/EXPERIMENTAL_view_account": {
                "post": {
                    "operationId": "rpc_EXPERIMENTAL_view_account",
                    "summary": "Returns account information.",
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "required": ["account_id"],
                                    "properties": {
                                        "account_id": { "$ref": "#/components/schemas/AccountId" },
                                        "finality": { "$ref": "#/components/schemas/Finality" }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/AccountView" } }
                            }
                        }
                    }
                }
            },
            "/gas_price": {
                "post": {
                    "operationId": "gas_price",
                    "requestBody": {
                        "required": false,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "block_id": {
                                            "anyOf": [
                                                { "$ref": "#/components/schemas/BlockId" },
                                                { "type": "null" }
                                            ]
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "required": ["gas_price"],
                                        "properties": { "gas_price": { "$ref": "#/components/schemas/NearToken" } }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "AccountId": { "type": "string", "description": "NEAR account identifier" },
                "CryptoHash": { "type": "string" },
                "NearToken": { "type": "string" },
                "Finality": { "type": "string", "enum": ["optimistic", "near-final", "final"] },
                "BlockId": {
                    "anyOf": [
                        { "title": "block_height", "type": "integer", "format": "uint64", "minimum": 0 },
                        { "$ref": "#/components/schemas/CryptoHash" }
                    ]
                },
                "AccountView": {
                    "type": "object",
                    "required": ["amount", "code_hash", "storage_usage"],
                    "properties": {
                        "amount": { "$ref": "#/components/schemas/NearToken" },
                        "code_hash": { "$ref": "#/components/schemas/CryptoHash" },
                        "storage_usage": { "type": "integer", "format": "uint64", "minimum": 0 }
                    }
                },
                "RpcBlockRequest": {
                    "type": "object",
                    "properties": {
                        "block_id": { "$ref": "#/components/schemas/BlockId" },
                        "finality": { "$ref": "#/components/schemas/Finality" }
                    }
                },
                "RpcBlockResponse": {
                    "type": "object",
                    "required": ["author", "header"],
                    "properties": {
                        "author": { "$ref": "#/components/schemas/AccountId" },
                        "header": {
                            "type": "object",
                            "required": ["height", "hash"],
                            "properties": {
                                "height": { "type": "integer", "format": "uint64", "minimum": 0 },
                                "hash": { "$ref": "#/components/schemas/CryptoHash" }
                            }
                        }
                    }
                },
                "RpcHealthRequest": { "type": "null" },
                "RpcHealthResponse": { "type": "null" },
                "RpcError": {
                    "type": "object",
                    "required": ["code", "message"],
                    "properties": {
                        "code": { "type": "integer", "format": "int64" },
                        "message": { "type": "string" },
                        "data": {},
                        "name": { "type": "string" },
                        "cause": {}
                    }
                },
                "JsonRpcRequest_for_block": request_envelope(
                    "block",
                    json!({ "$ref": "#/components/schemas/RpcBlockRequest" })
                ),
                "JsonRpcRequest_for_health": request_envelope(
                    "health",
                    json!({ "$ref": "#/components/schemas/RpcHealthRequest" })
                ),
                "JsonRpcResponse_for_RpcBlockResponse_and_RpcError": response_envelope(
                    json!({ "$ref": "#/components/schemas/RpcBlockResponse" })
                ),
                "JsonRpcResponse_for_Nullable_RpcHealthResponse_and_RpcError": response_envelope(json!({
                    "anyOf": [
                        { "$ref": "#/components/schemas/RpcHealthResponse" },
                        { "type": "null" }
                    ]
                }))
            }
        }
    })
}

pub(crate) fn near() -> SpecDocument {
    SpecDocument::from_value(near_document()).expect("fixture is a valid document")
}

/// [`near_document`] plus the types the client's query and token helpers
/// build on.
pub(crate) fn near_with_helpers_document() -> Value {
    let mut doc = near_document();
    let schemas = doc["components"]["schemas"]
        .as_object_mut()
        .expect("fixture has schemas");
    schemas.insert("PublicKey".into(), json!({ "type": "string" }));
    schemas.insert("NearGas".into(), json!({ "type": "integer", "format": "uint64", "minimum": 0 }));
    schemas.insert(
        "SyncCheckpoint".into(),
        json!({ "type": "string", "enum": ["genesis", "earliest_available"] }),
    );
    schemas.insert(
        "AccessKeyView".into(),
        json!({
            "type": "object",
            "required": ["nonce", "permission"],
            "properties": {
                "nonce": { "type": "integer", "format": "uint64", "minimum": 0 },
                "permission": {}
            }
        }),
    );
    schemas.insert(
        "CallResult".into(),
        json!({
            "type": "object",
            "required": ["logs", "result"],
            "properties": {
                "logs": { "type": "array", "items": { "type": "string" } },
                "result": { "type": "array", "items": { "type": "integer", "format": "uint8", "minimum": 0 } }
            }
        }),
    );
    doc
}

pub(crate) fn near_with_helpers() -> SpecDocument {
    SpecDocument::from_value(near_with_helpers_document()).expect("fixture is a valid document")
}
