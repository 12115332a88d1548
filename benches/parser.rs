use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rhttpd::parser::request::RequestParser;

const REQ_SHORT: &[u8] = b"\
GET /index.html HTTP/1.1\r\n\
Host: www.example.org\r\n\r\n";

const REQ_MED: &[u8] = b"\
GET /api/v1.0/weather/forecast HTTP/1.1\r\n\
Host: www.example.org\r\n\
Connection: keep-alive\r\n\
User-Agent: Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/109.0\r\n\
Accept: text/html,application/xhtml+xml\r\n\
Accept-Language: en-US,en;q=0.5\r\n\
Accept-Encoding: gzip,deflate,br\r\n\
Cache-Control: no-cache\r\n\r\n";

const REQ_MANY_HEADERS: &[u8] = b"\
GET /wp-content/uploads/2010/03/darth-vader-jedi-battle-lightsaber.jpg HTTP/1.1\r\n\
Host: www.example.org\r\n\
User-Agent: Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10.6; ja-JP-mac; rv:1.9.2.3) Gecko/20100401 Firefox/3.6.3\r\n\
Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n\
Accept-Language: ja,en-us;q=0.7,en;q=0.3\r\n\
Accept-Encoding: gzip,deflate\r\n\
Accept-Charset: Shift_JIS,utf-8;q=0.7,*;q=0.7\r\n\
Keep-Alive: 115\r\n\
Connection: keep-alive\r\n\
Referer: https://www.example.org/gallery/\r\n\
Cookie: wp_ozh_wsa_visits=2; wp_ozh_wsa_visit_lasttime=xxxxxxxxxx; __utma=xxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx; __utmz=xxxxxxxxx.xxxxxxxxxx.x.x.utmccn=(referral)|utmcsr=reader.example.com\r\n\r\n";

const REQ_WITH_BODY: &[u8] = b"\
GET /upload-echo HTTP/1.1\r\n\
Host: www.example.org\r\n\
Content-Length: 256\r\n\r\n";

fn benchmark(c: &mut Criterion) {
    let inputs = [REQ_SHORT, REQ_MED, REQ_MANY_HEADERS, REQ_WITH_BODY];

    let mut group = c.benchmark_group("parse");
    for &input in inputs.iter() {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("advance", input.len() as u64), input, |b, i| {
            b.iter(|| {
                let mut parser = RequestParser::new();
                let mut buf = [0u8; 2048];
                buf[..i.len()].copy_from_slice(i);
                let _ = parser.advance(&mut buf, i.len());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
