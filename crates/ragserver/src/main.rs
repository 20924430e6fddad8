use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{
    get, post, web, App, HttpResponse, HttpServer, Responder, Result as ActixResult,
};
use actix_ws::Message;
use futures::TryStreamExt;
use ragcore::{RunRequest, ValidateRequest, Workflow, WorkflowId};
use ragproviders::{
    chunk_metadata, chunk_text, extract_pdf_text, InMemoryVectorStore, ProviderSettings,
    ProviderStack, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
use ragruntime::{FlowRuntime, NodeDispatcher, RuntimeConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Application state shared across handlers
struct AppState {
    runtime: Arc<FlowRuntime>,
    store: Arc<InMemoryVectorStore>,
    workflows: Arc<RwLock<HashMap<WorkflowId, Workflow>>>,
}

/// Request body for running a saved workflow
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedRunRequest {
    query: String,
    #[serde(default, alias = "session_id")]
    session_id: Option<String>,
}

/// Request body for document ingestion
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRequest {
    text: String,
    #[serde(default, alias = "collection_name")]
    collection_name: Option<String>,
    #[serde(default)]
    embedding_provider: Option<String>,
    #[serde(default)]
    chunk_size: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentResponse {
    collection_name: String,
    chunks_created: usize,
    document_ids: Vec<String>,
}

/// Multipart form of a PDF upload
#[derive(Debug, Default)]
struct PdfUpload {
    filename: Option<String>,
    content: Vec<u8>,
    collection_name: Option<String>,
    embedding_provider: Option<String>,
    chunk_size: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PdfDocumentResponse {
    filename: String,
    collection_name: String,
    chunks_created: usize,
    document_ids: Vec<String>,
    embedding_provider: String,
    total_pages: usize,
    total_characters: usize,
}

/// Response for workflow creation
#[derive(Debug, Serialize)]
struct WorkflowResponse {
    id: Uuid,
    message: String,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(error: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.into(),
    })
}

/// Blank names get a fresh `doc_<8 hex>` collection.
fn collection_or_default(name: Option<String>) -> String {
    name.filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("doc_{}", &Uuid::new_v4().simple().to_string()[..8]))
}

fn form_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Drain a multipart upload into its file bytes and form fields.
async fn read_pdf_upload(mut payload: Multipart) -> ActixResult<PdfUpload> {
    let mut upload = PdfUpload::default();
    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "file" => {
                upload.filename = filename;
                upload.content = bytes;
            }
            "collectionName" | "collection_name" => {
                upload.collection_name = Some(form_text(&bytes));
            }
            "embeddingProvider" | "embedding_provider" => {
                upload.embedding_provider = Some(form_text(&bytes)).filter(|p| !p.is_empty());
            }
            "chunkSize" | "chunk_size" => upload.chunk_size = form_text(&bytes).parse().ok(),
            _ => {}
        }
    }
    Ok(upload)
}

fn not_found(workflow_id: Uuid) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: format!("Workflow {} not found", workflow_id),
    })
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "ragserver"
    }))
}

/// Validate a node/edge list without running it
#[post("/api/workflows/validate")]
async fn validate_workflow(
    data: web::Data<AppState>,
    req: web::Json<ValidateRequest>,
) -> ActixResult<impl Responder> {
    let report = data.runtime.validate(&req);
    Ok(HttpResponse::Ok().json(report))
}

/// Run a node/edge list against a query
#[post("/api/workflows/execute")]
async fn execute_inline(
    data: web::Data<AppState>,
    req: web::Json<RunRequest>,
) -> ActixResult<impl Responder> {
    let request = req.into_inner();
    info!("Executing workflow with {} nodes", request.nodes.len());

    let result = data.runtime.execute(&request).await;
    if !result.success {
        warn!("Workflow execution failed: {:?}", result.errors);
    }
    Ok(HttpResponse::Ok().json(result))
}

/// List all workflows
#[get("/api/workflows")]
async fn list_workflows(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let workflows = data.workflows.read().await;
    let workflow_list: Vec<_> = workflows
        .values()
        .map(|w| {
            serde_json::json!({
                "id": w.id,
                "name": w.name,
                "description": w.description,
                "nodes": w.nodes.len(),
                "edges": w.edges.len(),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(workflow_list))
}

/// Save a workflow definition
#[post("/api/workflows")]
async fn create_workflow(
    data: web::Data<AppState>,
    workflow: web::Json<Workflow>,
) -> ActixResult<impl Responder> {
    let workflow = workflow.into_inner();
    let workflow_id = workflow.id;

    let report = data
        .runtime
        .validate(&ValidateRequest {
            nodes: workflow.nodes.clone(),
            edges: workflow.edges.clone(),
        });
    for warning in report.warning_messages() {
        warn!("Workflow {}: {}", workflow_id, warning);
    }

    info!("Creating workflow: {} ({})", workflow.name, workflow_id);
    data.workflows.write().await.insert(workflow_id, workflow);

    Ok(HttpResponse::Created().json(WorkflowResponse {
        id: workflow_id,
        message: "Workflow created successfully".to_string(),
    }))
}

/// Get a specific workflow
#[get("/api/workflows/{id}")]
async fn get_workflow(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();
    let workflows = data.workflows.read().await;

    match workflows.get(&workflow_id) {
        Some(workflow) => Ok(HttpResponse::Ok().json(workflow)),
        None => Ok(not_found(workflow_id)),
    }
}

/// Delete a workflow
#[actix_web::delete("/api/workflows/{id}")]
async fn delete_workflow(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();
    let mut workflows = data.workflows.write().await;

    match workflows.remove(&workflow_id) {
        Some(_) => {
            info!("Deleted workflow: {}", workflow_id);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Workflow deleted successfully"
            })))
        }
        None => Ok(not_found(workflow_id)),
    }
}

/// Execute a saved workflow
#[post("/api/workflows/{id}/execute")]
async fn execute_workflow(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<SavedRunRequest>,
) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();
    let SavedRunRequest { query, session_id } = req.into_inner();

    // Release the lock before running so saves are not blocked
    let request = match data.workflows.read().await.get(&workflow_id) {
        Some(workflow) => workflow.run_request(query, session_id),
        None => return Ok(not_found(workflow_id)),
    };

    info!("Executing workflow: {}", workflow_id);
    let result = data.runtime.execute(&request).await;
    if result.success {
        info!(
            "Workflow {} completed: {} nodes",
            workflow_id,
            result.execution_log.len()
        );
    } else {
        error!("Workflow {} execution failed: {:?}", workflow_id, result.errors);
    }

    Ok(HttpResponse::Ok().json(result))
}

/// Chunk, embed and store a text document
#[post("/api/documents")]
async fn upload_document(
    data: web::Data<AppState>,
    req: web::Json<DocumentRequest>,
) -> ActixResult<impl Responder> {
    let req = req.into_inner();
    if req.text.trim().is_empty() {
        return Ok(bad_request("Document text is empty"));
    }

    let collection_name = collection_or_default(req.collection_name);
    let provider = req
        .embedding_provider
        .unwrap_or_else(|| ragcore::DEFAULT_EMBEDDING_PROVIDER.to_string());
    let chunks = chunk_text(
        &req.text,
        req.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
        DEFAULT_CHUNK_OVERLAP,
    );

    match data
        .store
        .add_documents(&collection_name, chunks, None, &provider)
        .await
    {
        Ok(document_ids) => {
            info!("Stored {} chunks in {}", document_ids.len(), collection_name);
            Ok(HttpResponse::Created().json(DocumentResponse {
                collection_name,
                chunks_created: document_ids.len(),
                document_ids,
            }))
        }
        Err(e) => {
            error!("Document ingestion into {} failed: {}", collection_name, e);
            Ok(HttpResponse::BadGateway().json(ErrorResponse {
                error: e.to_string(),
            }))
        }
    }
}

/// Extract the text of an uploaded PDF without storing it
#[post("/api/documents/extract")]
async fn extract_document(payload: Multipart) -> ActixResult<impl Responder> {
    let upload = read_pdf_upload(payload).await?;
    if upload.content.is_empty() {
        return Ok(bad_request("No PDF file uploaded"));
    }

    match web::block(move || extract_pdf_text(&upload.content)).await? {
        Ok(extracted) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "text": extracted.text,
            "totalPages": extracted.total_pages,
        }))),
        Err(e) => Ok(bad_request(e.to_string())),
    }
}

/// Extract, chunk, embed and store an uploaded PDF
#[post("/api/documents/upload")]
async fn upload_pdf(
    data: web::Data<AppState>,
    payload: Multipart,
) -> ActixResult<impl Responder> {
    let upload = read_pdf_upload(payload).await?;
    if upload.content.is_empty() {
        return Ok(bad_request("No PDF file uploaded"));
    }

    let filename = upload.filename.unwrap_or_else(|| "document.pdf".to_string());
    let content = upload.content;
    let extracted = match web::block(move || extract_pdf_text(&content)).await? {
        Ok(extracted) => extracted,
        Err(e) => {
            warn!("Could not read {}: {}", filename, e);
            return Ok(bad_request(e.to_string()));
        }
    };
    if extracted.text.trim().is_empty() {
        return Ok(bad_request(format!("No text found in {}", filename)));
    }

    let collection_name = collection_or_default(upload.collection_name);
    let provider = upload
        .embedding_provider
        .unwrap_or_else(|| ragcore::DEFAULT_EMBEDDING_PROVIDER.to_string());
    let chunks = chunk_text(
        &extracted.text,
        upload.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
        DEFAULT_CHUNK_OVERLAP,
    );
    let metadata = chunk_metadata(&filename, &chunks);

    match data
        .store
        .add_documents(&collection_name, chunks, Some(metadata), &provider)
        .await
    {
        Ok(document_ids) => {
            info!(
                "Stored {} chunks of {} in {}",
                document_ids.len(),
                filename,
                collection_name
            );
            Ok(HttpResponse::Created().json(PdfDocumentResponse {
                total_characters: extracted.total_characters(),
                total_pages: extracted.total_pages,
                filename,
                collection_name,
                chunks_created: document_ids.len(),
                document_ids,
                embedding_provider: provider,
            }))
        }
        Err(e) => {
            error!("Embedding {} into {} failed: {}", filename, collection_name, e);
            Ok(HttpResponse::BadGateway().json(ErrorResponse {
                error: e.to_string(),
            }))
        }
    }
}

#[get("/api/collections")]
async fn list_collections(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(HttpResponse::Ok().json(data.store.list_collections().await))
}

#[actix_web::delete("/api/collections/{name}")]
async fn delete_collection(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let name = path.into_inner();
    if data.store.delete_collection(&name).await {
        info!("Deleted collection: {}", name);
        Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Collection deleted successfully"
        })))
    } else {
        Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Collection {} not found", name),
        }))
    }
}

/// WebSocket endpoint for real-time events
#[get("/api/events")]
async fn websocket_events(
    req: actix_web::HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    info!("WebSocket client connected");

    let mut events = data.runtime.subscribe_events();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if let Ok(json) = serde_json::to_string(&event) {
                                if session.text(json).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("WebSocket client lagged, skipped {} events", skipped);
                        }
                        Err(_) => break,
                    }
                }

                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }

                else => break,
            }
        }

        info!("WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}

/// List available node kinds
#[get("/api/nodes")]
async fn list_node_kinds(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(HttpResponse::Ok().json(data.runtime.dispatcher().describe()))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚀 Starting RAG workflow server");

    let settings = ProviderSettings::from_env();
    if settings.openai_api_key.is_none() && settings.google_api_key.is_none() {
        warn!("No LLM API keys configured; generation nodes will fail");
    }
    let providers = ProviderStack::from_settings(&settings);

    let mut dispatcher = NodeDispatcher::new();
    ragnodes::register_all(&mut dispatcher, providers.collaborators.clone());
    let runtime = FlowRuntime::with_dispatcher(Arc::new(dispatcher), RuntimeConfig::default());

    info!("✅ Runtime initialized with {} node kinds", runtime.dispatcher().kinds().len());

    let app_state = web::Data::new(AppState {
        runtime: Arc::new(runtime),
        store: providers.store,
        workflows: Arc::new(RwLock::new(HashMap::new())),
    });

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    info!("🌐 Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .service(health_check)
            .service(validate_workflow)
            .service(execute_inline)
            .service(list_workflows)
            .service(create_workflow)
            .service(get_workflow)
            .service(delete_workflow)
            .service(execute_workflow)
            .service(upload_document)
            .service(extract_document)
            .service(upload_pdf)
            .service(list_collections)
            .service(delete_collection)
            .service(websocket_events)
            .service(list_node_kinds)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
