#![allow(dead_code)]

use async_trait::async_trait;
use ragsearch::{
    embedding::{Embedder, EmbeddingClientError},
    index::{IndexError, RecordId, SearchResult, VectorIndex, VectorRecord},
    llm::{LanguageModel, LanguageModelError, LlmClientError},
    processing::{SearchService, TextChunker},
};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

pub const DIMENSION: usize = 4;

/// How a fake capability behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Behavior {
    #[default]
    Succeed,
    Fail,
    /// Return one vector fewer than requested.
    ShortBatch,
    Panic,
}

#[derive(Default)]
pub struct FakeEmbedder {
    pub behavior: Behavior,
    /// Behavior for one zero-based call, overriding `behavior`.
    pub on_call: Option<(usize, Behavior)>,
    pub batches: Mutex<Vec<Vec<String>>>,
}

impl FakeEmbedder {
    pub fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn on_call(call: usize, behavior: Behavior) -> Self {
        Self {
            on_call: Some((call, behavior)),
            ..Self::default()
        }
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let len = text.chars().count() as f32;
        (0..DIMENSION).map(|i| len + i as f32).collect()
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_documents(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let call = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(texts.clone());
            batches.len() - 1
        };
        let behavior = match self.on_call {
            Some((target, behavior)) if target == call => behavior,
            _ => self.behavior,
        };
        match behavior {
            Behavior::Succeed => Ok(texts.iter().map(|text| Self::vector_for(text)).collect()),
            Behavior::Fail => Err(EmbeddingClientError::ProviderUnavailable(
                "embedder offline".into(),
            )),
            Behavior::ShortBatch => Ok(texts
                .iter()
                .skip(1)
                .map(|text| Self::vector_for(text))
                .collect()),
            Behavior::Panic => panic!("embedder crashed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HybridCall {
    pub query: String,
    pub vector: Vec<f32>,
    pub limit: usize,
}

#[derive(Default)]
pub struct RecordingIndex {
    pub behavior: Behavior,
    pub writes: Mutex<Vec<Vec<VectorRecord>>>,
    pub hybrid_calls: Mutex<Vec<HybridCall>>,
    pub similar_calls: Mutex<Vec<(RecordId, usize)>>,
}

impl RecordingIndex {
    pub fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn canned_result() -> SearchResult {
        serde_json::from_value(json!({
            "hits": [
                { "id": "1__0", "chunk": "AI is the study of intelligent agents.", "url": null },
                { "id": "2__0", "chunk": "Technology companies invest in AI.", "url": "http://b" }
            ],
            "query": "ignored",
            "processingTimeMs": 4,
            "limit": 2,
            "offset": 0,
            "estimatedTotalHits": 2
        }))
        .unwrap()
    }

    pub fn writes(&self) -> Vec<Vec<VectorRecord>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn hybrid_calls(&self) -> Vec<HybridCall> {
        self.hybrid_calls.lock().unwrap().clone()
    }

    pub fn similar_calls(&self) -> Vec<(RecordId, usize)> {
        self.similar_calls.lock().unwrap().clone()
    }

    fn failure(&self) -> Result<(), IndexError> {
        match self.behavior {
            Behavior::Fail => Err(IndexError::UnexpectedStatus {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "index unavailable".into(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn add_records(&self, records: Vec<VectorRecord>) -> Result<(), IndexError> {
        self.failure()?;
        self.writes.lock().unwrap().push(records);
        Ok(())
    }

    async fn hybrid_search(
        &self,
        query: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<SearchResult, IndexError> {
        self.hybrid_calls.lock().unwrap().push(HybridCall {
            query: query.to_string(),
            vector,
            limit,
        });
        self.failure()?;
        Ok(Self::canned_result())
    }

    async fn similarity_search(
        &self,
        id: &RecordId,
        limit: usize,
    ) -> Result<SearchResult, IndexError> {
        self.similar_calls.lock().unwrap().push((id.clone(), limit));
        self.failure()?;
        Ok(Self::canned_result())
    }
}

pub struct FakeLanguageModel {
    pub keywords: String,
    pub summary: String,
    pub keyword_behavior: Behavior,
    pub summary_behavior: Behavior,
    pub keyword_calls: Mutex<Vec<String>>,
    pub summary_calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl Default for FakeLanguageModel {
    fn default() -> Self {
        Self {
            keywords: "AI, technology".into(),
            summary: "AI is the study of intelligent agents.".into(),
            keyword_behavior: Behavior::Succeed,
            summary_behavior: Behavior::Succeed,
            keyword_calls: Mutex::new(Vec::new()),
            summary_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeLanguageModel {
    pub fn keyword_calls(&self) -> Vec<String> {
        self.keyword_calls.lock().unwrap().clone()
    }

    pub fn summary_calls(&self) -> Vec<(String, Vec<Value>)> {
        self.summary_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeLanguageModel {
    async fn extract_keywords(&self, query: &str) -> Result<String, LanguageModelError> {
        self.keyword_calls.lock().unwrap().push(query.to_string());
        match self.keyword_behavior {
            Behavior::Fail => Err(LanguageModelError::KeywordExtraction(
                LlmClientError::GenerationFailed("keyword model offline".into()),
            )),
            _ => Ok(self.keywords.clone()),
        }
    }

    async fn summarize(&self, query: &str, hits: &[Value]) -> Result<String, LanguageModelError> {
        self.summary_calls
            .lock()
            .unwrap()
            .push((query.to_string(), hits.to_vec()));
        match self.summary_behavior {
            Behavior::Fail => Err(LanguageModelError::Summarization(
                LlmClientError::GenerationFailed("summary model offline".into()),
            )),
            _ => Ok(self.summary.clone()),
        }
    }
}

pub struct Harness {
    pub embedder: Arc<FakeEmbedder>,
    pub index: Arc<RecordingIndex>,
    pub llm: Arc<FakeLanguageModel>,
    pub service: Arc<SearchService>,
}

impl Harness {
    pub fn new(embedder: FakeEmbedder, index: RecordingIndex, llm: FakeLanguageModel) -> Self {
        let embedder = Arc::new(embedder);
        let index = Arc::new(index);
        let llm = Arc::new(llm);
        let chunker = TextChunker::characters(4000, 200).unwrap();
        let service = Arc::new(SearchService::new(
            chunker,
            embedder.clone(),
            index.clone(),
            llm.clone(),
        ));
        Self {
            embedder,
            index,
            llm,
            service,
        }
    }

    pub fn healthy() -> Self {
        Self::new(
            FakeEmbedder::default(),
            RecordingIndex::default(),
            FakeLanguageModel::default(),
        )
    }
}
