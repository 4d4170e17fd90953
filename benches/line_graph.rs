use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use line2vec::core::{BallOptimizer, EmbeddingMatrix, SphereSet};
use line2vec::graph::{EdgeIndexMap, Incidence};
use line2vec::line_graph::{LineGraph, LineGraphWeighter};
use line2vec::utils::random_graph;

fn bench_weighting(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_graph_weighting");
    for &nodes in &[100u64, 1_000] {
        let graph = random_graph(nodes, nodes as usize * 4, 1).unwrap();
        let line = LineGraph::derive(&graph).unwrap();

        group.bench_with_input(BenchmarkId::new("sequential", nodes), &nodes, |b, _| {
            let weighter = LineGraphWeighter::default().with_parallel_threshold(usize::MAX);
            b.iter(|| weighter.weigh(black_box(&graph), black_box(&line)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("parallel", nodes), &nodes, |b, _| {
            let weighter = LineGraphWeighter::default().with_parallel_threshold(0);
            b.iter(|| weighter.weigh(black_box(&graph), black_box(&line)).unwrap());
        });
    }
    group.finish();
}

fn bench_advance(c: &mut Criterion) {
    let graph = random_graph(500, 2_000, 2).unwrap();
    let index = EdgeIndexMap::from_graph(&graph);
    let incidence = Incidence::build(&graph, &index).unwrap();
    let embeddings = EmbeddingMatrix::seeded(index.len(), 64, 3);
    let spheres = SphereSet::initialize(&embeddings, &incidence).unwrap();
    let shrunk = SphereSet::new(spheres.centers().clone(), spheres.radii() * 0.5).unwrap();

    c.bench_function("ball_optimizer_advance", |b| {
        b.iter(|| {
            let mut optimizer =
                BallOptimizer::new(embeddings.clone(), shrunk.clone(), &incidence, 0.01).unwrap();
            optimizer.advance(black_box(1.0)).unwrap()
        })
    });
}

criterion_group!(benches, bench_weighting, bench_advance);
criterion_main!(benches);
